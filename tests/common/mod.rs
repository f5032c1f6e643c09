#![allow(dead_code)]

pub mod fake_ai;
pub mod harness;
pub mod http_client;
