pub mod doctor;
pub mod onboard;
pub mod runtime;
pub mod serve;
pub mod tools;
