//! Backend services

pub mod storage;
