use std::env;
use std::io::{BufRead, Write};

use ludwigia::service::skye_v1::{Instruction, Outcome, Payload, Response};
use ludwigia_client::client::skye_v1::{prep_request, HttpClient};

fn render(response: &Response) {
    match (&response.result, &response.payload) {
        (Outcome::Success, Payload::Table(table)) => {
            println!("{:<8} {:>12} {:>8}", "ticker", "price", "signal");
            for idx in 0..table.ticker.len() {
                println!(
                    "{:<8} {:>12.4} {:>8}",
                    table.ticker[idx], table.price[idx], table.signal[idx]
                );
            }
        }
        (Outcome::Success, Payload::Message(message)) => println!("{message}"),
        (Outcome::Success, Payload::Empty) => {
            if let Instruction::Report = response.instruction {
                println!("report refreshed");
            }
        }
        (Outcome::Error, payload) => match payload {
            Payload::Message(message) => println!("Action failed: {message}"),
            _ => println!("Action failed"),
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8080".to_string());
    let client = HttpClient::new(path);

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!(">>");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let query = match prep_request(&line?) {
            Ok(query) => query,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        match client.send(&query).await {
            Ok(response) => render(&response),
            Err(err) => println!("Request failed: {err}"),
        }
    }
    Ok(())
}
