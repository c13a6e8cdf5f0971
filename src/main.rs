use actix::Actor;
use actix_web::{
    self, App, HttpServer,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::Arc;

use relations_backend::{
    ENV,
    configs::connect_database,
    middlewares::authentication,
    modules::{
        notification::repository_pg::NotificationRepositoryPg,
        push::{handler::push_handler, publisher::PushPublisher, server::PushServer},
        relationship::{repository_pg::RelationshipRepositoryPg, service::RelationshipService},
        user::repository_pg::UserRepositoryPg,
    },
};

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| std::io::Error::other(format!("Migration error: {e}")))?;

    let push_server = PushServer::new().start();

    let relationship_service = RelationshipService::with_dependencies(
        Arc::new(RelationshipRepositoryPg::new(db_pool.clone())),
        Arc::new(UserRepositoryPg::new(db_pool.clone())),
        Arc::new(NotificationRepositoryPg::new(db_pool.clone())),
        Arc::new(PushPublisher::new(push_server.clone())),
    );

    println!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = actix_cors::Cors::default()
            .allowed_origin(ENV.frontend_url.as_str())
            .allow_any_header()
            .allow_any_method()
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(relationship_service.clone()))
            .app_data(web::Data::new(push_server.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .service(health_check)
            .route("/ws", web::get().to(push_handler))
            .service(
                web::scope("/api")
                    .wrap(from_fn(authentication))
                    .configure(relations_backend::modules::relationship::route::configure),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
