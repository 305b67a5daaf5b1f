//! Linux location implementation using the GeoClue2 D-Bus service.
//!
//! GeoClue has no notion of mocked fixes, so every sample reports
//! `is_simulated = false`.

use log::warn;
use zbus::Connection;
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

use crate::{Accuracy, LocationError, LocationResult, LocationSample, WatchOptions, timestamp_now};

const GEOCLUE_BUS: &str = "org.freedesktop.GeoClue2";
const MANAGER_PATH: &str = "/org/freedesktop/GeoClue2/Manager";
const MANAGER_IFACE: &str = "org.freedesktop.GeoClue2.Manager";
const CLIENT_IFACE: &str = "org.freedesktop.GeoClue2.Client";
const LOCATION_IFACE: &str = "org.freedesktop.GeoClue2.Location";
const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";
const DESKTOP_ID: &str = "mockguard";
const ACCESS_DENIED: &str = "org.freedesktop.DBus.Error.AccessDenied";

fn dbus_error(context: &str) -> impl FnOnce(zbus::Error) -> LocationError + '_ {
    move |e| LocationError::Unknown(format!("{context}: {e}"))
}

// GClueAccuracyLevel values.
const fn accuracy_level(accuracy: Accuracy) -> u32 {
    match accuracy {
        Accuracy::Low => 4,
        Accuracy::Balanced => 6,
        Accuracy::High => 8,
    }
}

/// A started GeoClue2 client.
#[derive(Debug)]
pub struct Session {
    connection: Connection,
    client: OwnedObjectPath,
}

impl Session {
    pub async fn open(options: &WatchOptions) -> LocationResult<Self> {
        let connection = Connection::system()
            .await
            .map_err(dbus_error("D-Bus connection failed"))?;

        let (client,): (OwnedObjectPath,) = connection
            .call_method(Some(GEOCLUE_BUS), MANAGER_PATH, Some(MANAGER_IFACE), "GetClient", &())
            .await
            .map_err(dbus_error("GeoClue2 not available"))?
            .body()
            .deserialize()
            .map_err(dbus_error("failed to parse GetClient reply"))?;

        let session = Self { connection, client };
        if let Err(err) = session.configure_and_start(options).await {
            session.delete_client().await;
            return Err(err);
        }
        Ok(session)
    }

    async fn configure_and_start(&self, options: &WatchOptions) -> LocationResult<()> {
        self.set_client_property("DesktopId", Value::from(DESKTOP_ID)).await?;
        self.set_client_property(
            "RequestedAccuracyLevel",
            Value::from(accuracy_level(options.accuracy)),
        )
        .await?;
        // GeoClue thresholds are whole meters and seconds.
        self.set_client_property(
            "DistanceThreshold",
            Value::from(options.min_distance_m.max(0.0).ceil() as u32),
        )
        .await?;
        self.set_client_property(
            "TimeThreshold",
            Value::from(u32::try_from(options.min_interval.as_secs()).unwrap_or(u32::MAX)),
        )
        .await?;

        self.connection
            .call_method(Some(GEOCLUE_BUS), self.client.as_str(), Some(CLIENT_IFACE), "Start", &())
            .await
            .map_err(|e| match e {
                zbus::Error::MethodError(name, ..) if name.as_str() == ACCESS_DENIED => {
                    LocationError::PermissionDenied
                }
                other => LocationError::Unknown(format!("failed to start GeoClue client: {other}")),
            })?;
        Ok(())
    }

    pub async fn fix(&self) -> LocationResult<LocationSample> {
        let value = self
            .get_property(self.client.as_str(), CLIENT_IFACE, "Location")
            .await?;
        let location =
            OwnedObjectPath::try_from(value).map_err(|_| LocationError::NotAvailable)?;

        // The client reports "/" until the first fix arrives.
        if location.as_str() == "/" {
            return Err(LocationError::NotAvailable);
        }

        let latitude = self.location_f64(&location, "Latitude").await?;
        let longitude = self.location_f64(&location, "Longitude").await?;
        let altitude = self.location_f64(&location, "Altitude").await.ok();
        let accuracy = self.location_f64(&location, "Accuracy").await.ok();

        Ok(LocationSample {
            latitude,
            longitude,
            is_simulated: false,
            captured_at: timestamp_now(),
            altitude,
            horizontal_accuracy: accuracy,
        })
    }

    pub async fn close(self) {
        if let Err(err) = self
            .connection
            .call_method(Some(GEOCLUE_BUS), self.client.as_str(), Some(CLIENT_IFACE), "Stop", &())
            .await
        {
            warn!("failed to stop GeoClue client: {err}");
        }
        self.delete_client().await;
    }

    async fn delete_client(&self) {
        if let Err(err) = self
            .connection
            .call_method(
                Some(GEOCLUE_BUS),
                MANAGER_PATH,
                Some(MANAGER_IFACE),
                "DeleteClient",
                &(&self.client,),
            )
            .await
        {
            warn!("failed to delete GeoClue client: {err}");
        }
    }

    async fn set_client_property(&self, name: &str, value: Value<'_>) -> LocationResult<()> {
        self.connection
            .call_method(
                Some(GEOCLUE_BUS),
                self.client.as_str(),
                Some(PROPERTIES_IFACE),
                "Set",
                &(CLIENT_IFACE, name, value),
            )
            .await
            .map_err(|e| LocationError::Unknown(format!("failed to set {name}: {e}")))?;
        Ok(())
    }

    async fn get_property(&self, path: &str, iface: &str, name: &str) -> LocationResult<OwnedValue> {
        self.connection
            .call_method(Some(GEOCLUE_BUS), path, Some(PROPERTIES_IFACE), "Get", &(iface, name))
            .await
            .map_err(|e| LocationError::Unknown(format!("failed to get {name}: {e}")))?
            .body()
            .deserialize()
            .map_err(|e| LocationError::Unknown(format!("failed to parse {name}: {e}")))
    }

    async fn location_f64(&self, location: &OwnedObjectPath, name: &str) -> LocationResult<f64> {
        let value = self.get_property(location.as_str(), LOCATION_IFACE, name).await?;
        f64::try_from(value).map_err(|e| LocationError::Unknown(format!("invalid {name}: {e}")))
    }
}
