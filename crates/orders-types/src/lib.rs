//! orders-types: order domain model, repository port and the shared JSON envelope

pub mod domain {
    pub mod order;
}

pub mod ports {
    pub mod order_repository;
}

pub mod response;
