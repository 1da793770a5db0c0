//! Server-rendered pages.
//!
//! Templates are bundled into the binary with `include_str!`; there is no
//! reload at runtime. Names end in `.html`, which turns on MiniJinja's HTML
//! auto-escaping for every interpolated value (chat text is user content).

use std::sync::Arc;

use minijinja::{Environment, Value, context};

use crate::config::ChannelConfig;
use crate::services::archive::ChatMessage;

/// Banner shown on the index page when a fetch returns nothing.
pub const FETCH_FAILED_MESSAGE: &str = "Could not fetch the live chat. Is the stream running?";

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

#[derive(Clone)]
pub struct Pages {
    env: Arc<Environment<'static>>,
}

impl Pages {
    /// Compile the bundled templates.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to parse.
    pub fn new() -> Result<Self, PageError> {
        let mut env = Environment::new();
        env.add_template("setup.html", include_str!("../templates/setup.html"))?;
        env.add_template("setup_done.html", include_str!("../templates/setup_done.html"))?;
        env.add_template("logged_out.html", include_str!("../templates/logged_out.html"))?;
        env.add_template("index.html", include_str!("../templates/index.html"))?;
        Ok(Self { env: Arc::new(env) })
    }

    fn render(&self, name: &str, ctx: Value) -> Result<String, PageError> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }

    /// Setup form, prefilled with the current channel and client id.
    /// The secret is never echoed back.
    pub fn setup(&self, current: Option<&ChannelConfig>) -> Result<String, PageError> {
        self.render(
            "setup.html",
            context! {
                channel_id => current.map(|c| c.channel_id.as_str()).unwrap_or_default(),
                client_id => current.map(|c| c.client_id.as_str()).unwrap_or_default(),
            },
        )
    }

    pub fn setup_done(&self, config: &ChannelConfig) -> Result<String, PageError> {
        self.render("setup_done.html", context! { channel_id => config.channel_id })
    }

    pub fn logged_out(&self) -> Result<String, PageError> {
        self.render("logged_out.html", context! {})
    }

    pub fn index(
        &self,
        config: &ChannelConfig,
        comments: &[ChatMessage],
        error: Option<&str>,
    ) -> Result<String, PageError> {
        self.render(
            "index.html",
            context! {
                channel_id => config.channel_id,
                comments => comments,
                error => error,
            },
        )
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
