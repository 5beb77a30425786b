pub mod stale_media;
