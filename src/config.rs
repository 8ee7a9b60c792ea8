//! Runtime configuration.
//!
//! Every setting is a command-line flag with an environment fallback, so the
//! same binary runs from a shell or from a container manifest:
//!
//! | Flag | Env | Default |
//! |---|---|---|
//! | `--addr` | `BIND_ADDR` | `0.0.0.0:3000` |
//! | `--base-url` | `BASE_URL` | `http://localhost:3000` |
//! | `--jwt-secret` | `JWT_SECRET_KEY` | required |
//! | `--page-size` | `PAGE_SIZE` | `10` |
//! | `--max-body` | `MAX_BODY_BYTES` | `1048576` |

use std::net::SocketAddr;
use std::num::NonZeroUsize;

use clap::Parser;

use crate::pagination::PAGE_SIZE;
use crate::server::DEFAULT_MAX_BODY;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Socket address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub addr: SocketAddr,

    /// Public origin prefixed to pagination links.
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:3000")]
    pub base_url: String,

    /// HS256 secret for signing and verifying bearer tokens.
    #[arg(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    pub jwt_secret: String,

    /// Rows per page in list responses.
    #[arg(long, env = "PAGE_SIZE", default_value_t = PAGE_SIZE.get() as u32,
          value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub page_size: u32,

    /// Largest request body buffered, in bytes.
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY)]
    pub max_body: usize,
}

impl Config {
    pub fn page_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.page_size as usize).unwrap_or(PAGE_SIZE)
    }
}
