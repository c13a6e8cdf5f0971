pub mod notification {
    pub mod repository;
    pub mod repository_pg;
    pub mod schema;
}

pub mod push {
    pub mod events;
    pub mod handler;
    pub mod message;
    pub mod publisher;
    pub mod server;
    pub mod session;
}

pub mod relationship {
    pub mod handle;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod route;
    pub mod schema;
    pub mod service;
}

pub mod user {
    pub mod repository;
    pub mod repository_pg;
    pub mod schema;
}
