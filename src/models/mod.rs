// src/models/mod.rs
pub mod course;
pub mod enrollment;
pub mod payment;
pub mod user;
