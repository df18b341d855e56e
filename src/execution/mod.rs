pub mod scorer;
pub mod worker;
