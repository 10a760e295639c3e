pub mod aspect;
pub mod keys;
pub mod media;
pub mod storage;
pub mod upload_service;
pub mod videos;
