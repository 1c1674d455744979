pub mod directory_cache;
