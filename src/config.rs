use std::collections::BTreeSet;
use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use tracing::warn;

use crate::greedy::GreedyVolumePacker;
use crate::model::ContainerProfile;
use crate::packer::PackingMode;
use crate::partition::{PlanningConfig, Pooling, ProfileCatalog};
use crate::placer::PlacementConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            engine: EngineConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8000;
    const HOST_VAR: &'static str = "STOWAGE_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "STOWAGE_PLANNER_API_PORT";

    fn from_env() -> Self {
        let host_value =
            env_string(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string(Self::PORT_VAR) {
            Some(raw) => parse_port(&raw, Self::PORT_VAR).unwrap_or(Self::DEFAULT_PORT),
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            display_host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
        }
    }
}

/// Configuration of the packing engine: planning parameters and placement tolerances.
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    planning: PlanningConfig,
    placement: PlacementConfig,
}

impl EngineConfig {
    const MODE_VAR: &'static str = "STOWAGE_PLANNER_MODE";
    const POOLING_VAR: &'static str = "STOWAGE_PLANNER_POOLING";
    const MAX_CONTAINERS_VAR: &'static str = "STOWAGE_PLANNER_MAX_CONTAINERS";
    const EFFICIENCY_VAR: &'static str = "STOWAGE_PLANNER_EFFICIENCY";
    const REFRIGERATED_CATEGORIES_VAR: &'static str = "STOWAGE_PLANNER_REFRIGERATED_CATEGORIES";
    const SUPPORT_RATIO_VAR: &'static str = "STOWAGE_PLANNER_SUPPORT_RATIO";
    const FLOOR_EPSILON_VAR: &'static str = "STOWAGE_PLANNER_FLOOR_EPSILON";
    const ROTATION_EPSILON_VAR: &'static str = "STOWAGE_PLANNER_ROTATION_EPSILON";
    const ALLOW_ROTATION_VAR: &'static str = "STOWAGE_PLANNER_ALLOW_ROTATIONS";

    pub fn new(planning: PlanningConfig, placement: PlacementConfig) -> Self {
        Self {
            planning,
            placement,
        }
    }

    fn from_env() -> Self {
        let mode = env_string(Self::MODE_VAR)
            .and_then(|raw| parse_with_warning::<PackingMode>(&raw, Self::MODE_VAR))
            .unwrap_or_default();

        let pooling = env_string(Self::POOLING_VAR)
            .and_then(|raw| parse_with_warning::<Pooling>(&raw, Self::POOLING_VAR))
            .unwrap_or_default();

        let max_containers = env_string(Self::MAX_CONTAINERS_VAR)
            .and_then(|raw| parse_with_warning::<usize>(&raw, Self::MAX_CONTAINERS_VAR))
            .filter(|&value| {
                if value == 0 {
                    warn!(
                        "⚠️ {} must not be 0. Using {}.",
                        Self::MAX_CONTAINERS_VAR,
                        PlanningConfig::DEFAULT_MAX_CONTAINERS
                    );
                }
                value > 0
            })
            .unwrap_or(PlanningConfig::DEFAULT_MAX_CONTAINERS);

        let efficiency = load_f64_with_warning(
            Self::EFFICIENCY_VAR,
            GreedyVolumePacker::DEFAULT_EFFICIENCY,
            |value| value > 0.0 && value <= 1.0,
            "must be greater than 0 and at most 1",
            "Warning: Adjusted stowage efficiency changes volume-only container counts",
        );

        let refrigerated_categories = env_string(Self::REFRIGERATED_CATEGORIES_VAR)
            .map(|raw| parse_list(&raw))
            .filter(|set| !set.is_empty())
            .unwrap_or_else(|| ProfileCatalog::default().refrigerated_categories);

        let catalog = ProfileCatalog {
            refrigerated: profile_from_env("REEFER", ContainerProfile::refrigerated()),
            standard: profile_from_env("STANDARD", ContainerProfile::high_cube()),
            refrigerated_categories,
        };

        let support_ratio = load_f64_with_warning(
            Self::SUPPORT_RATIO_VAR,
            PlacementConfig::DEFAULT_SUPPORT_RATIO,
            |value| (0.0..=1.0).contains(&value),
            "must be between 0 and 1",
            "Warning: Adjusted minimum support may lead to unstable stacks",
        );

        let floor_epsilon = load_f64_with_warning(
            Self::FLOOR_EPSILON_VAR,
            PlacementConfig::DEFAULT_FLOOR_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
            "Warning: Adjusted floor tolerance may cause unexpected placements",
        );

        let rotation_epsilon = load_f64_with_warning(
            Self::ROTATION_EPSILON_VAR,
            PlacementConfig::DEFAULT_ROTATION_EPSILON,
            |value| value >= 0.0,
            "must not be negative",
            "Warning: Adjusted rotation tolerance changes which items are tried turned",
        );

        let allow_item_rotation = env_string(Self::ALLOW_ROTATION_VAR)
            .and_then(|raw| parse_bool(&raw, Self::ALLOW_ROTATION_VAR))
            .unwrap_or(PlacementConfig::DEFAULT_ALLOW_ITEM_ROTATION);

        let placement = PlacementConfig::builder()
            .support_ratio(support_ratio)
            .floor_epsilon(floor_epsilon)
            .rotation_epsilon(rotation_epsilon)
            .allow_item_rotation(allow_item_rotation)
            .build();

        let planning = PlanningConfig {
            mode,
            pooling,
            max_containers,
            efficiency,
            catalog,
        };

        Self {
            planning,
            placement,
        }
    }

    /// Returns the configured PlanningConfig.
    pub fn planning(&self) -> &PlanningConfig {
        &self.planning
    }

    /// Returns the configured PlacementConfig.
    pub fn placement(&self) -> PlacementConfig {
        self.placement
    }
}

/// Reads `STOWAGE_PLANNER_{prefix}_{LENGTH,WIDTH,HEIGHT,VOLUME,MAX_WEIGHT}` on top of `default`.
///
/// A combination the profile constructor rejects falls back to `default` as a whole.
fn profile_from_env(prefix: &str, default: ContainerProfile) -> ContainerProfile {
    let var = |field: &str| format!("STOWAGE_PLANNER_{}_{}", prefix, field);
    let positive = |value: f64| value > 0.0;
    let hint = "must be greater than 0";
    let note = "Info: Using a custom container profile";

    let length = load_f64_with_warning(&var("LENGTH"), default.length, positive, hint, note);
    let width = load_f64_with_warning(&var("WIDTH"), default.width, positive, hint, note);
    let height = load_f64_with_warning(&var("HEIGHT"), default.height, positive, hint, note);
    let volume = load_f64_with_warning(&var("VOLUME"), default.volume_capacity, positive, hint, note);
    let weight = load_f64_with_warning(
        &var("MAX_WEIGHT"),
        default.weight_capacity,
        positive,
        hint,
        note,
    );

    match ContainerProfile::new(default.kind.clone(), (length, width, height), volume, weight) {
        Ok(profile) => profile,
        Err(err) => {
            warn!("⚠️ {}. Using default {} profile.", err, default.kind);
            default
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn parse_port(raw: &str, var_name: &str) -> Option<u16> {
    match raw.trim().parse::<u16>() {
        Ok(0) => {
            warn!("⚠️ {} must not be 0. Using default value.", var_name);
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}'): {}. Using default value.",
                var_name, raw, err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn parse_with_warning<T>(raw: &str, var_name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}'): {}. Using default value.",
                var_name, raw, err
            );
            None
        }
    }
}

/// Comma separated list, blanks dropped.
fn parse_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect()
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) => {
                if !value.is_finite() || !validator(value) {
                    warn!(
                        "⚠️ {} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    let tolerance = (default.abs().max(1.0)) * 1e-9;
                    if (value - default).abs() > tolerance {
                        warn!("⚠️ {} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                warn!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}
