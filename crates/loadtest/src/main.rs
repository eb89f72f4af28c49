use goose::prelude::*;
use std::env;

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

async fn verify_session(user: &mut GooseUser) -> TransactionResult {
    let token = env::var("SESSION_TOKEN").unwrap_or_default();
    let request_builder = user
        .get_request_builder(&GooseMethod::Get, "/auth/verify")?
        .bearer_auth(token);
    let goose_request = GooseRequest::builder()
        .set_request_builder(request_builder)
        .build();
    let _goose_metrics = user.request(goose_request).await?;
    Ok(())
}

async fn verify_without_token(user: &mut GooseUser) -> TransactionResult {
    let goose_request = GooseRequest::builder()
        .path("/auth/verify")
        .expect_status_code(401)
        .build();
    let _goose_metrics = user.request(goose_request).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    if env::var("SESSION_TOKEN").is_err() {
        println!("No SESSION_TOKEN environment variable set, /auth/verify will answer 403");
    }

    GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("SessionVerification")
                .register_transaction(transaction!(verify_session))
                .register_transaction(transaction!(verify_without_token)),
        )
        .execute()
        .await?;

    Ok(())
}
