use std::env;
use std::fs::read_to_string;

use actix_web::{web, App, HttpServer};
use log::info;

use ludwigia::service::skye_v1::{ServerConfig, Skye};
use ludwigia_http::http::skye_v1::message;

const SNAPSHOT_PATH: &str = "report.csv";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        anyhow::bail!("usage: skye_server_v1 <address> <port> <config.json> [tickers...]");
    }

    let address = args[1].clone();
    let port: u16 = args[2].parse()?;
    let mut config: ServerConfig = serde_json::from_str(&read_to_string(&args[3])?)?;
    if args.len() > 4 {
        config.tickers = args[4..].to_vec();
    }

    let skye = Skye::from_config(&config, SNAPSHOT_PATH);
    skye.init(&config.tickers).await?;
    info!(
        "SKYE: serving {} tickers at {} interval on {}:{}",
        config.tickers.len(),
        config.interval.label(),
        address,
        port
    );

    let app_state = web::Data::new(skye);
    HttpServer::new(move || App::new().app_data(app_state.clone()).service(message))
        .bind((address.as_str(), port))?
        .run()
        .await?;
    Ok(())
}
