pub mod age;
pub mod contact;
pub mod files;
pub mod names;
pub mod national_id;
pub mod password;
