//! Routes and the route guard.

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Records,
    AddRecord,
    Company,
    Dashboard,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Self::Login,
        Self::Records,
        Self::AddRecord,
        Self::Company,
        Self::Dashboard,
    ];

    /// Where a successful login lands.
    pub const LANDING: Route = Route::Records;

    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Records => "/",
            Self::AddRecord => "/addRecord",
            Self::Company => "/company",
            Self::Dashboard => "/dashboard",
        }
    }

    /// Resolve a path. A single trailing slash is ignored; unknown paths give `None`.
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = match path.strip_suffix('/') {
            Some("") | None => path,
            Some(rest) => rest,
        };
        Self::ALL.into_iter().find(|r| r.path() == trimmed)
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Self::Login)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Records => "Records",
            Self::AddRecord => "Add Record",
            Self::Company => "Company",
            Self::Dashboard => "Dashboard",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Side menu entries: key, label and target route.
pub const MENU: [(&str, &str, Route); 2] = [
    ("records", "Records", Route::Records),
    ("company", "Company", Route::Company),
];

/// Menu key highlighted for `path`. Paths without a menu entry select `dashboard`.
pub fn menu_key_for_path(path: &str) -> &'static str {
    MENU.iter()
        .find(|(_, _, route)| route.path() == path)
        .map(|(key, _, _)| *key)
        .unwrap_or("dashboard")
}

/// How a navigation changes history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Push,
    Replace,
}

/// Result of passing a route through the guard.
#[derive(Debug, PartialEq)]
pub enum Guarded<V> {
    Render(V),
    Redirect { to: Route, mode: Navigation },
}

impl<V> Guarded<V> {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }
}

/// Gate `route` on `session`.
///
/// `render` runs only for public routes or authenticated sessions, so nothing a
/// protected view produces exists in an unauthenticated pass. Otherwise the
/// caller is sent to the login route, replacing the current history entry.
pub fn guard<V>(route: Route, session: &Session, render: impl FnOnce() -> V) -> Guarded<V> {
    if route.is_protected() && !session.authenticated {
        tracing::debug!("Guard redirecting {} to {}", route, Route::Login);
        return Guarded::Redirect {
            to: Route::Login,
            mode: Navigation::Replace,
        };
    }
    Guarded::Render(render())
}

/// Navigation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<Route>,
}

impl History {
    pub fn new(start: Route) -> Self {
        Self {
            entries: vec![start],
        }
    }

    pub fn current(&self) -> Route {
        // Never empty: created with one entry, and entries are only added or replaced.
        self.entries.last().copied().unwrap_or(Route::LANDING)
    }

    pub fn entries(&self) -> &[Route] {
        &self.entries
    }

    pub fn apply(&mut self, route: Route, mode: Navigation) {
        match mode {
            Navigation::Push => self.entries.push(route),
            Navigation::Replace => {
                if let Some(last) = self.entries.last_mut() {
                    *last = route;
                }
            }
        }
    }
}

/// History plus the guard.
#[derive(Debug, Clone)]
pub struct Router {
    history: History,
}

impl Router {
    pub fn new(start: Route) -> Self {
        Self {
            history: History::new(start),
        }
    }

    pub fn current(&self) -> Route {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Push `route` and render it through the guard.
    ///
    /// A redirect replaces the entry that was just pushed, so the protected
    /// route never stays in history.
    pub fn navigate<V>(
        &mut self,
        route: Route,
        session: &Session,
        render: impl FnOnce() -> V,
    ) -> Guarded<V> {
        self.history.apply(route, Navigation::Push);
        let outcome = guard(route, session, render);
        if let Guarded::Redirect { to, mode } = &outcome {
            self.history.apply(*to, *mode);
        }
        outcome
    }

    /// Resolve `path` and navigate to it. Unknown paths leave history untouched.
    pub fn open<V>(
        &mut self,
        path: &str,
        session: &Session,
        render: impl FnOnce(Route) -> V,
    ) -> Option<Guarded<V>> {
        let route = Route::from_path(path)?;
        Some(self.navigate(route, session, || render(route)))
    }
}
