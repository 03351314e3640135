use crate::command::server::error::Error;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::AsHeaderName;
use hyper::http::request::Parts;
use std::net::SocketAddr;

pub trait HeaderExt {
    fn get_header<K: AsHeaderName>(&self, header: K) -> Option<String>;
    fn client_ip(&self) -> Option<String>;
}

impl HeaderExt for Parts {
    fn get_header<K>(&self, header: K) -> Option<String>
    where
        K: AsHeaderName,
    {
        self.headers
            .get(header)
            .and_then(|header| header.to_str().ok())
            .map(ToString::to_string)
    }

    /// First `X-Forwarded-For` hop, then `X-Real-IP`, then the peer address of the connection.
    fn client_ip(&self) -> Option<String> {
        let forwarded_for = self
            .get_header("X-Forwarded-For")
            .and_then(|value| value.split(',').next().map(|ip| ip.trim().to_string()))
            .filter(|ip| !ip.is_empty());

        forwarded_for
            .or_else(|| {
                self.get_header("X-Real-IP")
                    .map(|ip| ip.trim().to_string())
                    .filter(|ip| !ip.is_empty())
            })
            .or_else(|| {
                self.extensions
                    .get::<SocketAddr>()
                    .map(|address| address.ip().to_string())
            })
    }
}

pub async fn collect_body<B>(body: B, limit: usize) -> Result<Bytes, Error>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(error) if error.is::<LengthLimitError>() => {
            let msg = format!("request body exceeds {limit} bytes");
            Err(Error::InvalidArgument(msg))
        }
        Err(error) => {
            let msg = format!("Failed to read request body: {error}");
            Err(Error::Internal(msg))
        }
    }
}
