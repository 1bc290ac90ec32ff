use actix_web::web;

pub mod awards;
pub mod game;
pub mod health;
pub mod me;
pub mod students;

/// Register every route. `main.rs` adds CORS on top; tests use this as is.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure_routes);

    cfg.service(
        web::scope("/api")
            .service(web::scope("/me").configure(me::configure_routes))
            .service(web::scope("/students").configure(students::configure_routes))
            .service(web::scope("/awards").configure(awards::configure_routes))
            .service(web::scope("/game").configure(game::configure_routes)),
    );
}
