//! BLE telemetry adapter.
//!
//! Implements [`TelemetryPort`]: live readings go out as GATT
//! notifications, and the callbacks feed connect/disconnect/calibrate
//! events into the [`LinkEventQueue`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid BLE GATT server via `esp_idf_svc::sys`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Characteristic  | UUID                                     | Perms  |
//! |-----------------|------------------------------------------|--------|
//! | TX / O2 %       | `44aa55a3-564f-4d9a-b20e-6636e0c43dfc`   | Notify |
//! | Calibrate       | `8d07c070-b5e0-4859-bc71-88b425e040c0`   | Write  |
//! | He voltage      | `868b31f7-4c08-4d5f-b0fa-9e5151b19f5c`   | Notify |
//! | He %            | `61de16b4-dbcf-491a-8ed6-5ba35a9c60e7`   | Notify |
//! | O2 voltage      | `55920ac9-31d3-45d3-8d4e-89566077fbd9`   | Notify |
//! | Pressure        | `68848368-6d91-49f9-9a5f-fed73463c9f6`   | Notify |
//! | Temperature     | `a9bac333-e37c-42a9-8abc-9b07350e189d`   | Notify |
//!
//! The mobile app reads the O2 percentage from the same characteristic the
//! JSON record goes out on, so both share one UUID.

use log::{info, warn};

use crate::app::ports::TelemetryPort;
use crate::config::MAX_DEVICE_NAME_LEN;
use crate::error::TransportError;
use crate::events::{LinkEvent, LinkEventQueue};
use crate::telemetry::TelemetryChannel;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x9243e98a_314c_42b2_a4fc_c23d54f0f271;
pub const CHAR_TX: u128 = 0x44aa55a3_564f_4d9a_b20e_6636e0c43dfc;
pub const CHAR_CALIBRATE: u128 = 0x8d07c070_b5e0_4859_bc71_88b425e040c0;
pub const CHAR_HE_VOLTAGE: u128 = 0x868b31f7_4c08_4d5f_b0fa_9e5151b19f5c;
pub const CHAR_HE_PERCENTAGE: u128 = 0x61de16b4_dbcf_491a_8ed6_5ba35a9c60e7;
pub const CHAR_O2_VOLTAGE: u128 = 0x55920ac9_31d3_45d3_8d4e_89566077fbd9;
pub const CHAR_O2_PERCENTAGE: u128 = CHAR_TX;
pub const CHAR_PRESSURE: u128 = 0x68848368_6d91_49f9_9a5f_fed73463c9f6;
pub const CHAR_TEMPERATURE: u128 = 0xa9bac333_e37c_42a9_8abc_9b07350e189d;

/// Longest value a single notification may carry (ATT maximum).
pub const MAX_NOTIFY_LEN: usize = 512;

/// Characteristic a logical channel is published on.
pub const fn channel_uuid(channel: TelemetryChannel) -> u128 {
    match channel {
        TelemetryChannel::Readings => CHAR_TX,
        TelemetryChannel::O2Percentage => CHAR_O2_PERCENTAGE,
        TelemetryChannel::O2Voltage => CHAR_O2_VOLTAGE,
        TelemetryChannel::HeVoltage => CHAR_HE_VOLTAGE,
        TelemetryChannel::HePercentage => CHAR_HE_PERCENTAGE,
        TelemetryChannel::Pressure => CHAR_PRESSURE,
        TelemetryChannel::Temperature => CHAR_TEMPERATURE,
    }
}

// ───────────────────────────────────────────────────────────────
// BLE state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    /// Not discoverable (before start, or after a client left).
    Idle,
    Advertising,
    Connected,
    /// Stack bring-up failed; the analyzer keeps running without BLE.
    Failed,
}

// ── ESP-IDF BLE static state (callback-safe atomics) ──────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. These atomics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
mod esp {
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use esp_idf_svc::sys::*;

    use super::*;

    pub(super) static GATTS_IF: AtomicU32 = AtomicU32::new(0);
    pub(super) static CONN_ID: AtomicU32 = AtomicU32::new(0);
    pub(super) static CONNECTED: AtomicBool = AtomicBool::new(false);
    static SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
    static CHAR_STEP: AtomicU32 = AtomicU32::new(0);

    struct CharDef {
        uuid: u128,
        notify: bool,
    }

    /// Registration order.  Handles land in `CHAR_HANDLES` at the same index.
    const CHARS: [CharDef; 7] = [
        CharDef { uuid: CHAR_TX, notify: true },
        CharDef { uuid: CHAR_CALIBRATE, notify: false },
        CharDef { uuid: CHAR_HE_VOLTAGE, notify: true },
        CharDef { uuid: CHAR_HE_PERCENTAGE, notify: true },
        CharDef { uuid: CHAR_O2_VOLTAGE, notify: true },
        CharDef { uuid: CHAR_PRESSURE, notify: true },
        CharDef { uuid: CHAR_TEMPERATURE, notify: true },
    ];
    const CALIBRATE_INDEX: usize = 1;

    static CHAR_HANDLES: [AtomicU32; 7] = [
        AtomicU32::new(0),
        AtomicU32::new(0),
        AtomicU32::new(0),
        AtomicU32::new(0),
        AtomicU32::new(0),
        AtomicU32::new(0),
        AtomicU32::new(0),
    ];

    /// Attribute handles: service + 7 characteristics + 7 values + 6 CCCDs.
    const SERVICE_HANDLES: u16 = 24;

    fn uuid128_to_esp(uuid: u128) -> esp_bt_uuid_t {
        let mut t: esp_bt_uuid_t = unsafe { core::mem::zeroed() };
        t.len = 16;
        unsafe {
            t.uuid.uuid128 = uuid.to_le_bytes();
        }
        t
    }

    pub(super) fn handle_for(uuid: u128) -> u16 {
        CHARS
            .iter()
            .position(|c| c.uuid == uuid)
            .map(|i| CHAR_HANDLES[i].load(Ordering::Relaxed) as u16)
            .unwrap_or(0)
    }

    unsafe fn add_char(svc_handle: u16, step: usize) {
        let def = &CHARS[step];
        let mut char_uuid = uuid128_to_esp(def.uuid);
        let (perm, prop) = if def.notify {
            (ESP_GATT_PERM_READ, ESP_GATT_CHAR_PROP_BIT_NOTIFY)
        } else {
            (ESP_GATT_PERM_WRITE, ESP_GATT_CHAR_PROP_BIT_WRITE)
        };
        esp_ble_gatts_add_char(
            svc_handle,
            &mut char_uuid,
            perm as esp_gatt_perm_t,
            prop as esp_gatt_char_prop_t,
            core::ptr::null_mut(),
            core::ptr::null_mut(),
        );
    }

    /// Client Characteristic Configuration descriptor, so clients can
    /// subscribe to notifications.
    unsafe fn add_cccd(svc_handle: u16) {
        let mut uuid: esp_bt_uuid_t = core::mem::zeroed();
        uuid.len = 2;
        uuid.uuid.uuid16 = ESP_GATT_UUID_CHAR_CLIENT_CONFIG as u16;
        esp_ble_gatts_add_char_descr(
            svc_handle,
            &mut uuid,
            (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
            core::ptr::null_mut(),
            core::ptr::null_mut(),
        );
    }

    unsafe fn add_next_char(svc_handle: u16) {
        let next = CHAR_STEP.fetch_add(1, Ordering::Relaxed) as usize + 1;
        if next < CHARS.len() {
            add_char(svc_handle, next);
        } else {
            log::info!("BLE GATTS: all characteristics registered");
        }
    }

    pub(super) unsafe fn start_advertising() {
        let mut adv_params = esp_ble_adv_params_t {
            adv_int_min: 0x20,
            adv_int_max: 0x40,
            adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
            own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
            channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
            adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
            ..core::mem::zeroed()
        };
        esp_ble_gap_start_advertising(&mut adv_params);
    }

    pub(super) unsafe extern "C" fn gap_event_handler(
        event: esp_gap_ble_cb_event_t,
        _param: *mut esp_ble_gap_cb_param_t,
    ) {
        match event {
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => {
                start_advertising();
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
                log::info!("BLE GAP: advertising started");
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
                log::info!("BLE GAP: advertising stopped");
            }
            _ => {}
        }
    }

    pub(super) unsafe extern "C" fn gatts_event_handler(
        event: esp_gatts_cb_event_t,
        gatts_if: esp_gatt_if_t,
        param: *mut esp_ble_gatts_cb_param_t,
    ) {
        GATTS_IF.store(gatts_if as u32, Ordering::Relaxed);

        match event {
            esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
                log::info!("BLE GATTS: app registered (if={})", gatts_if);
                let mut svc_id = esp_gatt_srvc_id_t {
                    id: esp_gatt_id_t {
                        uuid: uuid128_to_esp(SERVICE_UUID),
                        inst_id: 0,
                    },
                    is_primary: true,
                };
                esp_ble_gatts_create_service(gatts_if, &mut svc_id, SERVICE_HANDLES);
            }
            esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
                let svc_handle = (*param).create.service_handle;
                SVC_HANDLE.store(svc_handle as u32, Ordering::Relaxed);
                log::info!("BLE GATTS: service created (handle={})", svc_handle);
                esp_ble_gatts_start_service(svc_handle);
                CHAR_STEP.store(0, Ordering::Relaxed);
                add_char(svc_handle, 0);
            }
            esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
                let handle = (*param).add_char.attr_handle;
                let step = CHAR_STEP.load(Ordering::Relaxed) as usize;
                let svc_handle = SVC_HANDLE.load(Ordering::Relaxed) as u16;
                if let Some(slot) = CHAR_HANDLES.get(step) {
                    slot.store(handle as u32, Ordering::Relaxed);
                }
                if CHARS.get(step).is_some_and(|c| c.notify) {
                    add_cccd(svc_handle);
                } else {
                    add_next_char(svc_handle);
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
                add_next_char(SVC_HANDLE.load(Ordering::Relaxed) as u16);
            }
            esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
                let p = &(*param).connect;
                CONN_ID.store(p.conn_id as u32, Ordering::Relaxed);
                CONNECTED.store(true, Ordering::Release);
                log::info!("BLE GATTS: client connected (conn_id={})", p.conn_id);
                crate::events::push_link_event(LinkEvent::ClientConnected);
            }
            esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
                CONNECTED.store(false, Ordering::Release);
                log::info!("BLE GATTS: client disconnected");
                // Advertising is restarted by the driving loop.
                crate::events::push_link_event(LinkEvent::ClientDisconnected);
            }
            esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
                let p = &(*param).write;
                if p.need_rsp {
                    esp_ble_gatts_send_response(
                        gatts_if,
                        p.conn_id,
                        p.trans_id,
                        esp_gatt_status_t_ESP_GATT_OK,
                        core::ptr::null_mut(),
                    );
                }
                let calibrate = CHAR_HANDLES[CALIBRATE_INDEX].load(Ordering::Relaxed);
                if p.handle as u32 == calibrate && p.len > 0 {
                    crate::events::push_link_event(LinkEvent::CalibrationRequested);
                }
            }
            _ => {}
        }
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

pub struct BleTelemetry {
    state: BleState,
    device_name: heapless::String<MAX_DEVICE_NAME_LEN>,
    events: &'static LinkEventQueue,
    /// Simulation: every accepted notification, oldest first.
    #[cfg(not(target_os = "espidf"))]
    sim_sent: Vec<(TelemetryChannel, Vec<u8>)>,
    /// Simulation: how many times advertising was (re)started.
    #[cfg(not(target_os = "espidf"))]
    sim_adv_starts: u32,
}

impl BleTelemetry {
    /// `events` receives connect/disconnect/calibrate events; on the
    /// device this is [`crate::events::LINK_EVENTS`].
    pub fn new(
        device_name: heapless::String<MAX_DEVICE_NAME_LEN>,
        events: &'static LinkEventQueue,
    ) -> Self {
        Self {
            state: BleState::Idle,
            device_name,
            events,
            #[cfg(not(target_os = "espidf"))]
            sim_sent: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_adv_starts: 0,
        }
    }

    pub fn start(&mut self) {
        info!("BLE: starting advertising as '{}'", self.device_name);
        if self.platform_start() {
            self.state = BleState::Advertising;
        } else {
            self.state = BleState::Failed;
        }
    }

    #[cfg(target_os = "espidf")]
    pub fn state(&self) -> BleState {
        match self.state {
            BleState::Failed => BleState::Failed,
            _ if esp::CONNECTED.load(core::sync::atomic::Ordering::Acquire) => BleState::Connected,
            BleState::Connected => BleState::Idle,
            s => s,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn state(&self) -> BleState {
        self.state
    }

    // ── Callback entry points ─────────────────────────────────
    //
    // On the device the Bluedroid handlers above push the same events
    // directly; these are what the simulation (and tests) drive.

    pub fn on_central_connected(&mut self) {
        info!("BLE: central connected");
        self.state = BleState::Connected;
        self.push(LinkEvent::ClientConnected);
    }

    pub fn on_central_disconnected(&mut self) {
        info!("BLE: central disconnected");
        if self.state != BleState::Failed {
            self.state = BleState::Idle;
        }
        self.push(LinkEvent::ClientDisconnected);
    }

    /// Any non-empty write requests a calibration; the content is ignored.
    /// Returns whether a request was queued.
    pub fn on_calibrate_write(&mut self, raw: &[u8]) -> bool {
        if raw.is_empty() {
            return false;
        }
        info!("BLE: calibrate write ({} bytes)", raw.len());
        self.push(LinkEvent::CalibrationRequested)
    }

    fn push(&self, event: LinkEvent) -> bool {
        let accepted = self.events.push(event);
        if !accepted {
            warn!("BLE: link event queue full, dropped {:?}", event);
        }
        accepted
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> bool {
        use esp_idf_svc::sys::*;
        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK as i32 {
                log::error!("BLE: bt_controller_init failed ({})", ret);
                return false;
            }

            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK as i32 {
                log::error!("BLE: bt_controller_enable failed ({})", ret);
                return false;
            }

            let ret = esp_bluedroid_init();
            if ret != ESP_OK as i32 {
                log::error!("BLE: bluedroid_init failed ({})", ret);
                return false;
            }

            let ret = esp_bluedroid_enable();
            if ret != ESP_OK as i32 {
                log::error!("BLE: bluedroid_enable failed ({})", ret);
                return false;
            }

            esp_ble_gap_register_callback(Some(esp::gap_event_handler));
            esp_ble_gatts_register_callback(Some(esp::gatts_event_handler));
            esp_ble_gatts_app_register(0);

            // The JSON record is larger than the default 23-byte MTU.
            esp_ble_gatt_set_local_mtu(517);

            // NUL-terminated copy of the name for the C API.
            let mut name = [0u8; MAX_DEVICE_NAME_LEN + 1];
            name[..self.device_name.len()].copy_from_slice(self.device_name.as_bytes());
            esp_ble_gap_set_device_name(name.as_ptr() as *const _);

            // Advertising starts once the data is set (GAP handler).
            let mut adv_data = esp_ble_adv_data_t {
                set_scan_rsp: false,
                include_name: true,
                include_txpower: false,
                flag: (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8,
                ..core::mem::zeroed()
            };
            esp_ble_gap_config_adv_data(&mut adv_data);

            info!(
                "BLE(espidf): Bluedroid stack initialized, advertising as '{}'",
                self.device_name
            );
        }
        true
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> bool {
        self.sim_adv_starts += 1;
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.device_name, SERVICE_UUID
        );
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_restart_advertising(&mut self) {
        unsafe { esp::start_advertising() };
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_restart_advertising(&mut self) {
        self.sim_adv_starts += 1;
        info!("BLE(sim): advertising restarted");
    }

    #[cfg(target_os = "espidf")]
    fn platform_notify(
        &mut self,
        channel: TelemetryChannel,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;

        if !esp::CONNECTED.load(Ordering::Acquire) {
            return Err(TransportError::NotConnected);
        }
        let handle = esp::handle_for(channel_uuid(channel));
        if handle == 0 {
            return Err(TransportError::NotConnected);
        }
        let ret = unsafe {
            esp_ble_gatts_send_indicate(
                esp::GATTS_IF.load(Ordering::Relaxed) as esp_gatt_if_t,
                esp::CONN_ID.load(Ordering::Relaxed) as u16,
                handle,
                payload.len() as u16,
                payload.as_ptr() as *mut u8,
                false,
            )
        };
        if ret != ESP_OK as i32 {
            return Err(TransportError::Stack(ret));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_notify(
        &mut self,
        channel: TelemetryChannel,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        if self.state != BleState::Connected {
            return Err(TransportError::NotConnected);
        }
        self.sim_sent.push((channel, payload.to_vec()));
        Ok(())
    }

    /// Simulation: drain the notifications sent so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_take_sent(&mut self) -> Vec<(TelemetryChannel, Vec<u8>)> {
        core::mem::take(&mut self.sim_sent)
    }

    /// Simulation: how many times advertising was started.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_adv_starts(&self) -> u32 {
        self.sim_adv_starts
    }
}

// ───────────────────────────────────────────────────────────────
// TelemetryPort implementation
// ───────────────────────────────────────────────────────────────

impl TelemetryPort for BleTelemetry {
    fn notify(
        &mut self,
        channel: TelemetryChannel,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        if payload.len() > MAX_NOTIFY_LEN {
            warn!(
                "BLE: notification too large ({} > {})",
                payload.len(),
                MAX_NOTIFY_LEN
            );
            return Err(TransportError::PayloadTooLarge);
        }
        self.platform_notify(channel, payload)
    }

    fn restart_advertising(&mut self) {
        if self.state == BleState::Failed {
            return;
        }
        self.platform_restart_advertising();
        if self.state != BleState::Connected {
            self.state = BleState::Advertising;
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
