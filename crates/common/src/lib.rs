// contribution-common: prime selection and shared run types

pub mod primes;
pub mod types;
