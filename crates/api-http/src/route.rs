//! URL routing: `/<prefix>/<service>/<method>/<k1>/<v1>/...`

use switchboard_core::OutputFormat;

pub const DEFAULT_JSON_PREFIX: &str = "jsonservice";
pub const DEFAULT_XML_PREFIX: &str = "xmlservice";

/// Path prefixes that select the output format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub json_prefix: String,
    pub xml_prefix: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            json_prefix: DEFAULT_JSON_PREFIX.to_string(),
            xml_prefix: DEFAULT_XML_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub format: OutputFormat,
    pub service: String,
    pub method: String,
    /// Remainder after the method segment, without its leading slash
    pub suffix: String,
}

impl RouteConfig {
    /// `None` when the path is not a service call
    pub fn parse(&self, path: &str) -> Option<Route> {
        let mut parts = path.trim_start_matches('/').splitn(4, '/');

        let prefix = parts.next()?;
        let format = if prefix == self.xml_prefix {
            OutputFormat::Xml
        } else if prefix == self.json_prefix {
            OutputFormat::Json
        } else {
            return None;
        };

        let service = parts.next().filter(|s| !s.is_empty())?;
        let method = parts.next().filter(|m| !m.is_empty())?;
        let suffix = parts.next().unwrap_or_default();

        Some(Route {
            format,
            service: service.to_string(),
            method: method.to_string(),
            suffix: suffix.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_route_with_suffix() {
        let route = RouteConfig::default()
            .parse("/jsonservice/echo/ping/name/bob")
            .unwrap();
        assert_eq!(route.format, OutputFormat::Json);
        assert_eq!(route.service, "echo");
        assert_eq!(route.method, "ping");
        assert_eq!(route.suffix, "name/bob");
    }

    #[test]
    fn test_xml_prefix_selects_xml() {
        let route = RouteConfig::default().parse("/xmlservice/echo/ping").unwrap();
        assert_eq!(route.format, OutputFormat::Xml);
        assert_eq!(route.suffix, "");
    }

    #[test]
    fn test_incomplete_or_foreign_paths() {
        let routes = RouteConfig::default();
        assert!(routes.parse("/jsonservice/echo").is_none());
        assert!(routes.parse("/jsonservice/echo/").is_none());
        assert!(routes.parse("/jsonservice").is_none());
        assert!(routes.parse("/api/echo/ping").is_none());
        assert!(routes.parse("/").is_none());
    }

    #[test]
    fn test_custom_prefixes() {
        let routes = RouteConfig {
            json_prefix: "j".to_string(),
            xml_prefix: "x".to_string(),
        };
        assert_eq!(routes.parse("/x/a/b").unwrap().format, OutputFormat::Xml);
        assert!(routes.parse("/jsonservice/a/b").is_none());
    }
}
