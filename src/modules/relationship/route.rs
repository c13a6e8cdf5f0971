use crate::modules::relationship::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/relationships")
            .service(relationship_status)
            .service(send_request)
            .service(cancel_request)
            .service(accept_request)
            .service(decline_request)
            .service(unfriend)
            .service(relationship_counts)
            .service(list_incoming)
            .service(list_outgoing)
            .service(list_friends),
    );
}
