#![allow(dead_code)]

pub mod lro_server;
pub mod scripted;
