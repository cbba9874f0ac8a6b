pub mod image_storage;
