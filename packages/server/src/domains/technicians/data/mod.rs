pub mod technician;
