//! Attribute-keyed router
//!
//! The router reads one attribute from each record, hashes its value and
//! picks a numbered channel. Records without the attribute go to
//! [`Channel::Failure`].

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::Channel;
use crate::channel_set::{ChannelCount, ChannelSet};
use crate::config::{AttributeName, RoutingConfig};
use crate::error::{Result, RoutingError};
use crate::manager::ChannelSetManager;
use crate::property::Property;

/// Named attribute lookup on a record
///
/// Returning `None` covers both a missing key and a key with no value.
pub trait Attributes {
    fn attribute(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> Attributes for HashMap<String, String, S> {
    #[inline]
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<S: BuildHasher> Attributes for HashMap<String, Option<String>, S> {
    #[inline]
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Option::as_deref)
    }
}

impl Attributes for BTreeMap<String, String> {
    #[inline]
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<T: Attributes + ?Sized> Attributes for &T {
    #[inline]
    fn attribute(&self, name: &str) -> Option<&str> {
        (**self).attribute(name)
    }
}

/// Route a record against an explicit attribute name and channel set
///
/// This is the pure routing decision. It logs a warning when the attribute is
/// missing and never fails.
pub fn route_record<A: Attributes + ?Sized>(
    record: &A,
    attribute_name: &str,
    channels: &ChannelSet,
) -> Channel {
    match record.attribute(attribute_name) {
        Some(value) => {
            let channel = channels.channel_for_value(value);
            tracing::trace!(
                attribute = attribute_name,
                channel = %channel,
                channel_count = channels.len(),
                "record routed"
            );
            channel
        }
        None => {
            tracing::warn!(
                attribute = attribute_name,
                "routing attribute '{}' not found on record",
                attribute_name
            );
            Channel::Failure
        }
    }
}

/// A router instance
///
/// Owns its routing attribute and its channel set. Configuration changes and
/// routing may run concurrently from any number of threads: both settings are
/// published as atomic snapshots, so a `route()` call always sees a complete
/// channel set.
///
/// Until an attribute name is set the router is unconfigured and rejects
/// routing requests. The channel set starts as the single channel `1`.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use distributor_routing::{Channel, Router, RoutingConfig};
///
/// let router = Router::with_config(RoutingConfig::new("user", 1).unwrap());
///
/// let mut record = HashMap::new();
/// record.insert("user".to_string(), "alice".to_string());
/// assert_eq!(router.route(&record).unwrap(), Channel::Numbered(1));
///
/// let empty: HashMap<String, String> = HashMap::new();
/// assert_eq!(router.route(&empty).unwrap(), Channel::Failure);
/// ```
pub struct Router {
    /// Routing attribute, `None` while unconfigured
    attribute_name: ArcSwapOption<AttributeName>,

    /// Numbered channels
    channels: ChannelSetManager,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create an unconfigured router with the bootstrap channel set `{1}`
    pub fn new() -> Self {
        Self {
            attribute_name: ArcSwapOption::empty(),
            channels: ChannelSetManager::default(),
        }
    }

    /// Create a configured router
    pub fn with_config(config: RoutingConfig) -> Self {
        Self {
            attribute_name: ArcSwapOption::from_pointee(config.attribute_name),
            channels: ChannelSetManager::initialize(config.channel_count),
        }
    }

    /// Apply a full configuration
    ///
    /// The channel set is rebuilt unconditionally. The two settings are
    /// published separately, channel set first: a concurrent `route` may pair
    /// the previous attribute with the new set, but never the new attribute
    /// with the previous set.
    pub fn configure(&self, config: RoutingConfig) {
        self.set_channel_count(config.channel_count);
        self.set_attribute_name(config.attribute_name);
    }

    /// Change the routing attribute for future records
    pub fn set_attribute_name(&self, name: AttributeName) {
        tracing::info!(attribute = %name, "routing attribute set");
        self.attribute_name.store(Some(Arc::new(name)));
    }

    /// Return to the unconfigured state
    pub fn clear_attribute_name(&self) {
        tracing::info!("routing attribute cleared");
        self.attribute_name.store(None);
    }

    /// Rebuild the channel set for a new count
    pub fn set_channel_count(&self, count: ChannelCount) -> Arc<ChannelSet> {
        self.channels.rebuild(count)
    }

    /// Current routing attribute, if configured
    #[inline]
    pub fn attribute_name(&self) -> Option<Arc<AttributeName>> {
        self.attribute_name.load_full()
    }

    #[inline]
    pub fn is_configured(&self) -> bool {
        self.attribute_name.load().is_some()
    }

    /// The channel set manager
    #[inline]
    pub fn channels(&self) -> &ChannelSetManager {
        &self.channels
    }

    /// Current channel count
    #[inline]
    pub fn channel_count(&self) -> ChannelCount {
        self.channels.channel_count()
    }

    /// Every destination this router may transfer to
    pub fn all_channels(&self) -> Vec<Channel> {
        self.channels.all_channels()
    }

    /// Pick the destination channel for a record
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::NotConfigured`] if no attribute name is set.
    /// A missing attribute on the record is not an error; the record is
    /// routed to [`Channel::Failure`].
    pub fn route<A: Attributes + ?Sized>(&self, record: &A) -> Result<Channel> {
        let attribute_name = self.attribute_name.load();
        let Some(attribute_name) = attribute_name.as_deref() else {
            return Err(RoutingError::NotConfigured);
        };

        let channels = self.channels.load();
        Ok(route_record(record, attribute_name, &channels))
    }

    /// Destination a given attribute value maps to under the current set
    #[inline]
    pub fn route_value(&self, value: &str) -> Channel {
        self.channels.load().channel_for_value(value)
    }

    /// Properties this router accepts
    pub fn supported_properties() -> &'static [Property] {
        &Property::ALL
    }

    /// Apply a property change from the host
    ///
    /// `new_value` of `None` means the property was removed: the attribute
    /// name becomes unset and the channel count falls back to its default.
    /// Invalid values are rejected before anything is applied.
    pub fn on_property_modified(
        &self,
        property: Property,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> Result<()> {
        tracing::debug!(
            property = %property,
            old_value = ?old_value,
            new_value = ?new_value,
            "property modified"
        );

        match property {
            Property::AttributeName => match new_value {
                Some(value) => self.set_attribute_name(value.parse()?),
                None => self.clear_attribute_name(),
            },
            Property::RelationshipsNumber => {
                let value = new_value
                    .or(property.default_value())
                    .unwrap_or_default();
                self.channels.rebuild_from_str(value)?;
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("attribute_name", &self.attribute_name())
            .field("channels", &self.channels)
            .finish()
    }
}
