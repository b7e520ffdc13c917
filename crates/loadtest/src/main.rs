use goose::prelude::*;
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::redirect::Policy;

/// Keep cookies so `/callback` sees the session, and stop at the first redirect.
async fn setup_client(user: &mut GooseUser) -> TransactionResult {
    let builder = reqwest::Client::builder()
        .cookie_store(true)
        .redirect(Policy::none());
    user.set_client_builder(builder).await?;
    Ok(())
}

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

fn state_from_location(headers: &HeaderMap) -> Option<String> {
    let location = headers.get(LOCATION)?.to_str().ok()?;
    let url = url::Url::parse(location).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
}

async fn login_round_trip(user: &mut GooseUser) -> TransactionResult {
    let goose = user.get("/").await?;
    let Ok(response) = goose.response else {
        return Ok(());
    };
    let Some(state) = state_from_location(response.headers()) else {
        println!("login redirect without a state parameter");
        return Ok(());
    };
    let _goose_metrics = user.get(&format!("/callback?state={state}")).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("LoginRoundTrip")
                .register_transaction(transaction!(setup_client).set_on_start())
                .register_transaction(transaction!(login_round_trip)),
        )
        .execute()
        .await?;

    Ok(())
}
