pub mod customer_router;
pub mod technician_router;
