//! Page routes: `/`, `/services`, `/service-chat/:serviceTitle`, `/login`,
//! `/signup`, `/contact`, `/about`.

use crate::messages::Service;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Services,
    /// `service_title` is non-empty; build with [`Route::chat`] to enforce it.
    ServiceChat { service_title: String },
    Login,
    Signup,
    Contact,
    About,
}

impl Route {
    /// Match a URL path. Query string, fragment and trailing `/` are ignored.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        let route = match path {
            "" => Route::Home,
            "/services" => Route::Services,
            "/login" => Route::Login,
            "/signup" => Route::Signup,
            "/contact" => Route::Contact,
            "/about" => Route::About,
            _ => {
                let title = path.strip_prefix("/service-chat/")?;
                if title.is_empty() || title.contains('/') {
                    return None;
                }
                let service_title = urlencoding::decode(title).ok()?.into_owned();
                Route::ServiceChat { service_title }
            }
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".into(),
            Route::Services => "/services".into(),
            Route::ServiceChat { service_title } => {
                format!("/service-chat/{}", urlencoding::encode(service_title))
            }
            Route::Login => "/login".into(),
            Route::Signup => "/signup".into(),
            Route::Contact => "/contact".into(),
            Route::About => "/about".into(),
        }
    }

    /// Chat page for an arbitrary title. `None` for an empty title, which has
    /// no path that parses back.
    pub fn chat(service_title: &str) -> Option<Self> {
        if service_title.is_empty() {
            return None;
        }
        Some(Route::ServiceChat {
            service_title: service_title.to_string(),
        })
    }

    /// Chat page for a known service.
    pub fn service_chat(service: Service) -> Self {
        Route::ServiceChat {
            service_title: service.title().to_string(),
        }
    }

    /// The backend service a chat route talks to, if the title names one.
    pub fn service(&self) -> Option<Service> {
        match self {
            Route::ServiceChat { service_title } => Service::from_title(service_title),
            _ => None,
        }
    }

    pub fn page_name(&self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Services => "services",
            Route::ServiceChat { .. } => "service-chat",
            Route::Login => "login",
            Route::Signup => "signup",
            Route::Contact => "contact",
            Route::About => "about",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}
