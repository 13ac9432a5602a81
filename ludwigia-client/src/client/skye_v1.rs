use anyhow::Result;

use ludwigia::clock::DateTime;
use ludwigia::service::skye_v1::{Query, Response};

#[derive(Debug)]
pub struct HttpClient {
    pub path: String,
    pub client: reqwest::Client,
}

impl HttpClient {
    pub fn new(path: String) -> Self {
        Self {
            path,
            client: reqwest::Client::new(),
        }
    }

    pub async fn send(&self, query: &Query) -> Result<Response> {
        log::debug!("CLIENT: sending {} request", query.instruction);
        Ok(self
            .client
            .post(self.path.clone() + "/message")
            .json(query)
            .send()
            .await?
            .json::<Response>()
            .await?)
    }

    pub async fn data(&self, datetime: &str) -> Result<Response> {
        self.send(&Query::new("data", Some(datetime.to_string())))
            .await
    }

    pub async fn add(&self, ticker: &str) -> Result<Response> {
        self.send(&Query::new("add", Some(ticker.to_string())))
            .await
    }

    pub async fn delete(&self, ticker: &str) -> Result<Response> {
        self.send(&Query::new("delete", Some(ticker.to_string())))
            .await
    }

    pub async fn report(&self) -> Result<Response> {
        self.send(&Query::new("report", None)).await
    }
}

/// Turn one REPL line into a query, rejecting bad input locally so nothing malformed is ever
/// put on the wire. Mirrors the arity rules of the server instructions: `report` stands
/// alone, everything else takes exactly one argument, and `data` arguments must be datetimes.
pub fn prep_request(line: &str) -> Result<Query, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [] => Err("Invalid command".to_string()),
        [instruction] => {
            if *instruction == "report" {
                Ok(Query::new("report", None))
            } else {
                Err("Invalid command".to_string())
            }
        }
        [instruction, argument] => {
            if *instruction == "data" && DateTime::from_query_string(argument).is_err() {
                return Err("Datetime format incorrect".to_string());
            }
            Ok(Query::new(*instruction, Some(argument.to_string())))
        }
        _ => Err("Incorrect number of arguments".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::prep_request;

    #[test]
    fn test_that_report_takes_no_argument() {
        assert!(prep_request("report").is_ok());
        assert!(prep_request("data").is_err());
        assert!(prep_request("add").is_err());
    }

    #[test]
    fn test_that_extra_arguments_are_rejected() {
        assert!(prep_request("add IBM AAPL").is_err());
        assert!(prep_request("").is_err());
    }

    #[test]
    fn test_that_data_argument_must_be_a_datetime() {
        assert!(prep_request("data 2021-06-01-10:00").is_ok());
        assert!(prep_request("data yesterday").is_err());
    }

    #[test]
    fn test_that_unknown_instructions_still_go_to_the_server() {
        //The server owns the undefined-instruction response; the client only checks shape
        let query = prep_request("bogus IBM").unwrap();
        assert_eq!(query.instruction, "bogus");
    }
}
