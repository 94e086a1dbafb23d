mod server;

pub use server::{
    CreateOrderRequest, CreateOrderResponse, HttpServer, HttpServerConfig, UpdateItemsRequest,
    UpdateStatusRequest,
};
