//! HTTP collaborators: the download history and the three library managers.

pub mod http;
pub mod lidarr;
pub mod radarr;
pub mod sabnzbd;
pub mod sonarr;

pub use http::ArrClient;
pub use lidarr::LidarrClient;
pub use radarr::RadarrClient;
pub use sabnzbd::SabnzbdClient;
pub use sonarr::SonarrClient;
