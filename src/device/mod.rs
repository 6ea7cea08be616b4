//! Management facade: typed operations over the protocol stack.
//!
//! A [`Device`] owns one client engine, the SID table, and the vendor
//! resource configuration, and exposes the operations a management UI or
//! CLI calls: ping, identify, YANG get/set/delete, RPC invocation, firmware
//! streaming, and the TSN configuration helpers.

mod tsn;

pub use tsn::{CbsConfig, GateControlEntry, PtpInstance, TasSchedule};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::cbor::{self, YangValue};
use crate::client::{CoapClient, CoapRequest, Response};
use crate::coap::content_format;
use crate::config::{Config, ResourceConfig};
use crate::error::{Error, Result};
use crate::sid::SidTable;
use crate::transport::Transport;
use crate::types::{ConnectionState, DeviceEvent, DeviceModel, StackStats, TransferProgress};

/// Result of [`Device::identify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub model: DeviceModel,
    pub port_count: usize,
    /// yang-library checksum, when the device exposes one.
    pub checksum: Option<String>,
}

/// A connected VelocityDRIVE-SP switch.
pub struct Device {
    client: CoapClient,
    sid: Arc<SidTable>,
    resources: ResourceConfig,
}

impl Device {
    /// Take ownership of a transport and bring the link up. Entry to
    /// `Connected` requires a successful ping.
    pub async fn connect(transport: Box<dyn Transport>, config: &Config) -> Result<Self> {
        let client = CoapClient::new(transport, config.client.clone());

        let rtt = client.ping().await?;
        debug!(rtt_ms = rtt.as_millis() as u64, "device answered ping");
        client.set_state(ConnectionState::Connected);

        Ok(Self {
            client,
            sid: Arc::new(SidTable::embedded()),
            resources: config.resources.clone(),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.client.state()
    }

    pub fn stats(&self) -> StackStats {
        self.client.stats()
    }

    /// Announce/trace notifications from the device.
    pub fn events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.client.events()
    }

    pub fn sid_table(&self) -> &SidTable {
        &self.sid
    }

    /// The underlying engine, for callers that need raw exchanges.
    pub fn client(&self) -> &CoapClient {
        &self.client
    }

    /// Tear the link down. Outstanding exchanges fail with `TransportDown`.
    pub fn disconnect(&self) {
        self.client.shutdown();
    }

    /// MUP1-level ping; resolves with the round-trip time.
    pub async fn ping(&self) -> Result<Duration> {
        self.client.ping().await
    }

    /// Read the yang-library checksum and the interface table, and infer the
    /// switch model from the populated port count. An unrecognised count
    /// yields `DeviceModel::Unknown`, not a failure.
    pub async fn identify(&self) -> Result<DeviceInfo> {
        let checksum = match self
            .yang_get("/ietf-constrained-yang-library:yang-library/checksum")
            .await
        {
            Ok(value) => checksum_text(&value),
            Err(e) if e.is_recoverable() => return Err(e),
            Err(e) => {
                warn!(error = %e, "device has no yang-library checksum");
                None
            }
        };

        let interfaces = self.yang_get("/ietf-interfaces:interfaces").await?;
        let port_count = interface_count(&interfaces);

        Ok(DeviceInfo {
            model: DeviceModel::from_port_count(port_count),
            port_count,
            checksum,
        })
    }

    /// GET a YANG path and decode the CBOR payload.
    pub async fn yang_get(&self, path: &str) -> Result<YangValue> {
        let response = self
            .client
            .request(
                CoapRequest::get(path).accept(content_format::YANG_DATA_CBOR),
            )
            .await?;
        self.decode_payload(&response)
    }

    /// GET a set of leaves in one round trip, addressed by SID. The payload
    /// is a CBOR array of SIDs with the identifier content-format.
    pub async fn yang_get_many(&self, paths: &[&str]) -> Result<YangValue> {
        let sids = paths
            .iter()
            .map(|p| {
                self.sid
                    .sid_for_path(p)
                    .map(|s| YangValue::uint(u64::from(s)))
                    .ok_or_else(|| Error::UnknownSid((*p).to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let payload = cbor::encode(&YangValue::Array(sids), &self.sid)?;
        let response = self
            .client
            .request(
                CoapRequest::get("")
                    .payload(payload)
                    .content_format(content_format::YANG_IDENTIFIERS_CBOR)
                    .accept(content_format::YANG_DATA_CBOR),
            )
            .await?;
        self.decode_payload(&response)
    }

    /// PUT a value at a YANG path. The value is validated against the SID
    /// table's leaf metadata before encoding.
    pub async fn yang_set(&self, path: &str, value: YangValue) -> Result<()> {
        self.sid.validate(path, &value)?;
        let payload = cbor::encode(&value, &self.sid)?;
        self.client
            .request(
                CoapRequest::put(path)
                    .payload(payload)
                    .content_format(content_format::YANG_DATA_CBOR),
            )
            .await?;
        Ok(())
    }

    /// DELETE the node at a YANG path.
    pub async fn yang_delete(&self, path: &str) -> Result<()> {
        self.client.request(CoapRequest::delete(path)).await?;
        Ok(())
    }

    /// POST to an RPC or action resource, with optional input parameters.
    pub async fn yang_rpc(&self, path: &str, params: Option<YangValue>) -> Result<Option<YangValue>> {
        let mut request = CoapRequest::post(path).accept(content_format::YANG_DATA_CBOR);
        if let Some(params) = params {
            request = request
                .payload(cbor::encode(&params, &self.sid)?)
                .content_format(content_format::YANG_DATA_CBOR);
        }

        let response = self.client.request(request).await?;
        if response.payload.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.decode_payload(&response)?))
        }
    }

    /// Stream a firmware image to the vendor upgrade resource with Block1.
    /// Progress is reported per acknowledged block.
    pub async fn firmware_update(
        &self,
        image: &[u8],
        progress: Option<mpsc::UnboundedSender<TransferProgress>>,
    ) -> Result<()> {
        let path = self.resources.firmware.clone();
        let request = CoapRequest::put(path).payload(image.to_vec());
        let handle = self.client.submit_with_progress(request, progress).await?;
        handle.response().await?;
        Ok(())
    }

    /// Persist the running configuration.
    pub async fn save_config(&self) -> Result<()> {
        let path = self.resources.save_config.clone();
        self.yang_rpc(&path, None).await?;
        Ok(())
    }

    /// Reboot the device.
    pub async fn reset(&self) -> Result<()> {
        let path = self.resources.reset.clone();
        self.yang_rpc(&path, None).await?;
        Ok(())
    }

    fn decode_payload(&self, response: &Response) -> Result<YangValue> {
        if response.payload.is_empty() {
            return Ok(YangValue::Null);
        }
        cbor::decode(&response.payload, &self.sid).map_err(Error::Cbor)
    }
}

/// Count populated ports in a decoded interface table. The device may key
/// the reply by the container path or return the container body directly.
fn interface_count(value: &YangValue) -> usize {
    let root = value
        .get("/ietf-interfaces:interfaces")
        .unwrap_or(value);
    root.get("interface")
        .and_then(YangValue::as_array)
        .map_or(0, <[YangValue]>::len)
}

/// Extract the checksum text from its possible reply shapes.
fn checksum_text(value: &YangValue) -> Option<String> {
    let leaf = value
        .get("/ietf-constrained-yang-library:yang-library/checksum")
        .unwrap_or(value);
    match leaf {
        YangValue::Text(s) => Some(s.clone()),
        YangValue::Bytes(b) => Some(hex::encode(b)),
        _ => None,
    }
}

/// Render an error with its correlation token for operator-facing output.
pub fn describe_failure(err: &Error) -> String {
    match err {
        Error::ClientError { code, path, token } => {
            format!("device rejected request: {code} on {path} (token {token})")
        }
        Error::ServerError { code, path, token } => {
            format!("device failed internally: {code} on {path} (token {token})")
        }
        Error::Timeout {
            path,
            token,
            attempts,
        } => format!("no reply after {attempts} attempts on {path} (token {token})"),
        other => other.to_string(),
    }
}
