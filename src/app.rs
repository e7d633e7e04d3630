//! Application construction.
//!
//! # Responsibilities
//! - `App`: the setup phase. Owns the router tree, settings, templates and
//!   static mounts, and exposes the root router's registration methods
//! - `Application`: the serving phase. Route table walked, everything
//!   frozen behind `Arc`
//!
//! # Design Decisions
//! - `build` consumes the `App`, so nothing can be registered afterwards
//! - The route table is walked inside `build`; matcher conflicts abort
//!   construction instead of surfacing on the first request
//! - Configure once before serving: settings are cloned into an `Arc`
//!
//! # Data Flow
//! ```text
//! AppConfig ─┐
//!            ├→ App (register routes, middleware, params)
//! code ──────┘     → build() → Dispatcher::walk()
//!                  → Application → build_router() → axum::serve
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::{AppConfig, ListenerConfig, SettingValue, Settings, SettingsError, TemplatesConfig};
use crate::error::SetupError;
use crate::fs::{FileSystem, OsFileSystem};
use crate::http::handler::{Handler, Next};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::server::{build_router, ServerState, StaticMount};
use crate::lifecycle::Shutdown;
use crate::routing::{path, Dispatcher, NodeId, ResolvedRoute, Route, RouteTree};
use crate::view::Templates;

/// An application under construction.
#[derive(Debug)]
pub struct App {
    tree: RouteTree,
    settings: Settings,
    templates: Templates,
    statics: Vec<StaticMount>,
    listener: ListenerConfig,
    fs: Arc<dyn FileSystem>,
    shutdown: Shutdown,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            tree: RouteTree::new(),
            settings: Settings::default(),
            templates: Templates::empty(),
            statics: Vec::new(),
            listener: ListenerConfig::default(),
            fs: Arc::new(OsFileSystem),
            shutdown: Shutdown::new(),
        }
    }

    /// Create an app from a validated configuration: settings, listener,
    /// templates (read from disk) and static mounts.
    pub fn from_config(config: &AppConfig) -> Result<Self, SetupError> {
        let mut app = Self::new();
        app.settings = config.settings.clone();
        app.listener = config.listener.clone();

        if let Some(templates) = &config.templates {
            app.load_templates(&OsFileSystem, &templates.dir, templates)?;
        }
        for mount in &config.statics {
            app.static_files(&mount.prefix, &mount.dir)?;
        }

        tracing::info!(
            bind_address = %app.listener.bind_address,
            templates = app.templates.len(),
            statics = app.statics.len(),
            "Application configured"
        );
        Ok(app)
    }

    // ---- settings -----------------------------------------------------

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn get(&self, key: &str) -> Option<SettingValue> {
        self.settings.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<SettingValue>) -> Result<&mut Self, SettingsError> {
        self.settings.set(key, value)?;
        Ok(self)
    }

    pub fn enable(&mut self, key: &str) -> Result<&mut Self, SettingsError> {
        self.settings.enable(key)?;
        Ok(self)
    }

    pub fn disable(&mut self, key: &str) -> Result<&mut Self, SettingsError> {
        self.settings.disable(key)?;
        Ok(self)
    }

    pub fn enabled(&self, key: &str) -> bool {
        self.settings.enabled(key)
    }

    pub fn disabled(&self, key: &str) -> bool {
        self.settings.disabled(key)
    }

    pub fn listener_config(&mut self, listener: ListenerConfig) -> &mut Self {
        self.listener = listener;
        self
    }

    /// File system used by `send_file` and `download`.
    pub fn file_system(&mut self, fs: Arc<dyn FileSystem>) -> &mut Self {
        self.fs = fs;
        self
    }

    // ---- views and static files ---------------------------------------

    /// Load and compile every template below `root`.
    pub fn load_templates(
        &mut self,
        fs: &dyn FileSystem,
        root: impl AsRef<Path>,
        config: &TemplatesConfig,
    ) -> Result<&mut Self, SetupError> {
        self.templates = Templates::load(fs, root.as_ref(), config)
            .map_err(|e| SetupError::Template(e.to_string()))?;
        Ok(self)
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// Serve `dir` under `prefix` for requests no route matches.
    pub fn static_files(&mut self, prefix: &str, dir: impl Into<PathBuf>) -> Result<&mut Self, SetupError> {
        let dir = dir.into();
        let invalid = |reason: String| SetupError::StaticMount {
            prefix: prefix.to_string(),
            reason,
        };

        if !prefix.starts_with('/') {
            return Err(invalid("prefix must start with '/'".to_string()));
        }
        path::validate(prefix).map_err(|e| invalid(e.to_string()))?;
        let prefix = path::clean(prefix);
        if self.statics.iter().any(|m| m.prefix() == prefix) {
            return Err(invalid("prefix is already mounted".to_string()));
        }
        if !dir.is_dir() {
            return Err(invalid(format!("{} is not a directory", dir.display())));
        }

        tracing::debug!(prefix = %prefix, dir = %dir.display(), "Static mount added");
        self.statics.push(StaticMount::new(prefix, dir));
        Ok(self)
    }

    // ---- routing ------------------------------------------------------

    /// Registration handle for the root router.
    pub fn route(&mut self) -> Route<'_> {
        let root = self.tree.root();
        Route::new(&mut self.tree, root)
    }

    /// Reopen a router created earlier.
    pub fn node(&mut self, id: NodeId) -> Route<'_> {
        Route::new(&mut self.tree, id)
    }

    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    /// Mount a child router on the root.
    pub fn router(&mut self, path: &str) -> Result<Route<'_>, SetupError> {
        let id = self.tree.add_router(self.tree.root(), path)?;
        Ok(Route::new(&mut self.tree, id))
    }

    pub fn use_middleware(&mut self, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.route().use_middleware(handlers);
        self
    }

    pub fn param<F>(&mut self, name: &str, func: F) -> &mut Self
    where
        F: Fn(&mut Response, &mut Request, &mut Next, &str) + Send + Sync + 'static,
    {
        self.route().param(name, func);
        self
    }

    pub fn get(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.route().get(path, handlers)?;
        Ok(self)
    }

    pub fn post(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.route().post(path, handlers)?;
        Ok(self)
    }

    pub fn put(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.route().put(path, handlers)?;
        Ok(self)
    }

    pub fn delete(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.route().delete(path, handlers)?;
        Ok(self)
    }

    pub fn patch(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.route().patch(path, handlers)?;
        Ok(self)
    }

    pub fn options(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.route().options(path, handlers)?;
        Ok(self)
    }

    pub fn head(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.route().head(path, handlers)?;
        Ok(self)
    }

    pub fn all(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.route().all(path, handlers)?;
        Ok(self)
    }

    /// Handle that stops the server and cancels in-flight requests.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Freeze the app and build its route table.
    pub fn build(self) -> Result<Application, SetupError> {
        let dispatcher: Dispatcher = Dispatcher::new(self.tree);
        dispatcher.walk()?;

        let state = ServerState {
            dispatcher,
            settings: Arc::new(self.settings),
            templates: Arc::new(self.templates),
            fs: self.fs,
            statics: self.statics,
            body_limit: self.listener.body_limit_bytes,
            request_timeout: Duration::from_secs(self.listener.request_timeout_secs),
            shutdown: self.shutdown,
        };
        Ok(Application {
            state: Arc::new(state),
            bind_address: self.listener.bind_address,
        })
    }
}

/// A built application, ready to serve.
#[derive(Debug, Clone)]
pub struct Application {
    state: Arc<ServerState>,
    bind_address: String,
}

impl Application {
    /// Every registered route, in walk order.
    pub fn routes(&self) -> &[Arc<ResolvedRoute>] {
        match self.state.dispatcher.walk() {
            Ok(table) => table.routes(),
            Err(_) => &[],
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.state.shutdown.clone()
    }

    /// The axum router, for in-process use.
    pub fn router(&self) -> axum::Router {
        build_router(Arc::clone(&self.state))
    }

    /// Serve on `listener` until the shutdown handle is triggered.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.routes().len(), "HTTP server starting");

        let shutdown = self.state.shutdown.clone();
        let app = build_router(self.state).into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Bind the configured address and serve.
    pub async fn listen(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.bind_address).await?;
        self.serve(listener).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers;

    #[test]
    fn test_settings_delegate() {
        let mut app = App::new();
        assert!(app.enabled("x-powered-by"));
        app.disable("x-powered-by").unwrap().set("views", "pages").unwrap();
        assert!(app.disabled("x-powered-by"));
        assert_eq!(app.get("views"), Some(SettingValue::Str("pages".into())));
        assert!(app.set("trust proxy", "yes").is_err());
    }

    #[test]
    fn test_static_mount_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new();

        app.static_files("/assets/", dir.path()).unwrap();
        assert_eq!(app.statics[0].prefix(), "/assets");

        assert!(matches!(
            app.static_files("/assets", dir.path()),
            Err(SetupError::StaticMount { .. })
        ));
        assert!(matches!(
            app.static_files("public", dir.path()),
            Err(SetupError::StaticMount { .. })
        ));
        assert!(matches!(
            app.static_files("/missing", dir.path().join("nope")),
            Err(SetupError::StaticMount { .. })
        ));
    }

    #[test]
    fn test_build_walks_routes() {
        let mut app = App::new();
        app.get("/", handlers![|res, _req, _next| { res.send("home"); }]).unwrap();
        {
            let mut api = app.router("/api").unwrap();
            api.get("/users", handlers![|res, _req, _next| { res.send("users"); }])
                .unwrap();
        }
        let application = app.build().unwrap();
        let paths: Vec<&str> = application.routes().iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/api/users"]);
    }

    #[test]
    fn test_build_rejects_conflicting_routes() {
        let mut app = App::new();
        app.get("/users/:id", handlers![|_res, _req, _next| {}]).unwrap();
        app.get("/users/:name", handlers![|_res, _req, _next| {}]).unwrap();
        assert!(matches!(app.build(), Err(SetupError::RouteConflict { .. })));
    }
}
