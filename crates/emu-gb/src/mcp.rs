//! JSON-RPC control server for the Game Boy emulator.
//!
//! Exposes the machine as a JSON-RPC 2.0 server over stdin/stdout, one
//! request per line. Scripts and debuggers use it to boot, step, inspect
//! and patch the machine without a front end.

#![allow(clippy::redundant_closure_for_method_calls)]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use emu_core::Observable;

use crate::GameBoy;
use crate::config::{EntropyConfig, GbConfig, PowerOn};
use crate::error::StepError;
use crate::gameboy::parse_address;
use crate::trace::Trace;

/// Error code for an instruction the opcode table does not know.
const UNKNOWN_OPCODE: i32 = -32001;
/// Error code for a known instruction without an execution routine.
const UNIMPLEMENTED: i32 = -32002;

// ---------------------------------------------------------------------------
// JSON-RPC types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: JsonValue,
    id: JsonValue,
}

#[derive(Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
    id: JsonValue,
}

#[derive(Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

impl RpcResponse {
    fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    fn error(id: JsonValue, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(RpcError { code, message }),
            id,
        }
    }

    /// A stepping failure. The machine stays booted and inspectable.
    fn step_error(id: JsonValue, err: &StepError) -> Self {
        let code = if err.is_fatal() {
            UNIMPLEMENTED
        } else {
            UNKNOWN_OPCODE
        };
        Self::error(id, code, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Control server wrapping a headless Game Boy.
pub struct McpServer {
    gb: Option<GameBoy>,
    rom_path: Option<PathBuf>,
    boot_rom_path: Option<PathBuf>,
}

impl McpServer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            gb: None,
            rom_path: None,
            boot_rom_path: None,
        }
    }

    /// Set a default ROM path (from the `--rom` argument).
    pub fn set_rom_path(&mut self, path: PathBuf) {
        self.rom_path = Some(path);
    }

    /// Set a default boot ROM path (from the `--boot-rom` argument).
    pub fn set_boot_rom_path(&mut self, path: PathBuf) {
        self.boot_rom_path = Some(path);
    }

    /// Serve an already-built machine; `boot` replaces it.
    pub fn attach(&mut self, gb: GameBoy) {
        self.gb = Some(gb);
    }

    /// Run the server loop: read JSON-RPC from stdin, write responses to stdout.
    pub fn run(&mut self) {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = self.handle_line(line);
            let _ = writeln!(
                stdout,
                "{}",
                serde_json::to_string(&response).unwrap_or_default()
            );
            let _ = stdout.flush();
        }
    }

    fn handle_line(&mut self, line: &str) -> RpcResponse {
        let request: RpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                return RpcResponse::error(JsonValue::Null, -32700, format!("Parse error: {e}"));
            }
        };
        if request.jsonrpc != "2.0" {
            return RpcResponse::error(request.id, -32600, "Invalid JSON-RPC version".to_string());
        }
        self.dispatch(&request.method, &request.params, request.id)
    }

    fn dispatch(&mut self, method: &str, params: &JsonValue, id: JsonValue) -> RpcResponse {
        match method {
            "boot" => self.handle_boot(params, id),
            "step" => self.handle_step(id),
            "step_n" => self.handle_step_n(params, id),
            "run_frame" => self.handle_run_frame(params, id),
            "set_breakpoint" => self.handle_set_breakpoint(params, id),
            "poke" => self.handle_poke(params, id),
            "query" => self.handle_query(params, id),
            "registers" => self.handle_registers(id),
            "header" => self.handle_header(id),
            "history" => self.handle_history(id),
            "read_memory" => self.handle_read_memory(params, id),
            _ => RpcResponse::error(id, -32601, format!("Unknown method: {method}")),
        }
    }

    fn require_gb(&mut self, id: &JsonValue) -> Result<&mut GameBoy, RpcResponse> {
        self.gb.as_mut().ok_or_else(|| {
            RpcResponse::error(
                id.clone(),
                -32000,
                "No Game Boy instance. Call 'boot' first.".to_string(),
            )
        })
    }

    // === Tool handlers ===

    fn handle_boot(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        // ROM from params, path, or default
        let rom_data = if let Some(b64) = params.get("data").and_then(|v| v.as_str()) {
            match base64::engine::general_purpose::STANDARD.decode(b64) {
                Ok(d) => d,
                Err(e) => return RpcResponse::error(id, -32602, format!("Invalid base64: {e}")),
            }
        } else if let Some(path) = params
            .get("path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .or_else(|| self.rom_path.clone())
        {
            match std::fs::read(&path) {
                Ok(d) => d,
                Err(e) => return RpcResponse::error(id, -32000, format!("Cannot read ROM: {e}")),
            }
        } else {
            return RpcResponse::error(
                id,
                -32602,
                "Provide 'data' (base64), 'path', or --rom CLI argument".to_string(),
            );
        };

        let boot_rom = match params
            .get("boot_rom")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .or_else(|| self.boot_rom_path.clone())
        {
            Some(path) => match std::fs::read(&path) {
                Ok(d) => Some(d),
                Err(e) => {
                    return RpcResponse::error(id, -32000, format!("Cannot read boot ROM: {e}"));
                }
            },
            None => None,
        };

        let power_on = match params.get("power_on").and_then(|v| v.as_str()) {
            None | Some("post_boot") => PowerOn::PostBoot,
            Some("randomized") => PowerOn::Randomized,
            Some(other) => {
                return RpcResponse::error(id, -32602, format!("Unknown power_on: {other}"));
            }
        };
        let entropy = match params.get("seed").and_then(|v| v.as_u64()) {
            Some(seed) => EntropyConfig::Seeded(seed),
            None => EntropyConfig::System,
        };

        let config = GbConfig {
            rom_data,
            save_data: None,
            boot_rom,
            power_on,
            entropy,
        };
        match GameBoy::new(&config) {
            Ok(gb) => {
                let validity = gb
                    .cartridge()
                    .map(|cart| cart.validity().to_string())
                    .unwrap_or_default();
                self.gb = Some(gb);
                RpcResponse::success(id, serde_json::json!({"status": "ok", "validity": validity}))
            }
            Err(e) => RpcResponse::error(id, -32000, format!("Boot failed: {e}")),
        }
    }

    fn handle_step(&mut self, id: JsonValue) -> RpcResponse {
        let gb = match self.require_gb(&id) {
            Ok(gb) => gb,
            Err(e) => return e,
        };

        match gb.step_one() {
            Ok(record) => RpcResponse::success(id, trace_to_json(&record)),
            Err(err) => RpcResponse::step_error(id, &err),
        }
    }

    fn handle_step_n(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let gb = match self.require_gb(&id) {
            Ok(gb) => gb,
            Err(e) => return e,
        };

        let count = params.get("count").and_then(|v| v.as_u64()).unwrap_or(1);
        let Ok(count) = usize::try_from(count) else {
            return RpcResponse::error(id, -32602, "Invalid 'count'".to_string());
        };
        let breakpoint = match params.get("breakpoint") {
            None | Some(JsonValue::Null) => None,
            Some(v) => match address_param(v) {
                Some(a) => Some(a),
                None => {
                    return RpcResponse::error(id, -32602, "Invalid 'breakpoint'".to_string());
                }
            },
        };

        match gb.step_n(count, breakpoint) {
            Ok(summary) => RpcResponse::success(
                id,
                serde_json::json!({
                    "executed": summary.executed,
                    "hit_breakpoint": summary.hit_breakpoint,
                    "pc": format!("${:04X}", gb.registers().pc),
                }),
            ),
            Err(err) => RpcResponse::step_error(id, &err),
        }
    }

    fn handle_run_frame(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let gb = match self.require_gb(&id) {
            Ok(gb) => gb,
            Err(e) => return e,
        };

        let stop_after_one_frame = params
            .get("stop_after_one_frame")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        match gb.run_until_frame(stop_after_one_frame) {
            Ok(outcome) => {
                let mut result = serde_json::to_value(outcome).unwrap_or_default();
                if let Some(map) = result.as_object_mut() {
                    map.insert("frame_count".into(), gb.frame_count().into());
                    map.insert("pc".into(), format!("${:04X}", gb.registers().pc).into());
                }
                RpcResponse::success(id, result)
            }
            Err(err) => RpcResponse::step_error(id, &err),
        }
    }

    fn handle_set_breakpoint(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let gb = match self.require_gb(&id) {
            Ok(gb) => gb,
            Err(e) => return e,
        };

        let breakpoint = match params.get("address") {
            None | Some(JsonValue::Null) => None,
            Some(v) => match address_param(v) {
                Some(a) => Some(a),
                None => {
                    return RpcResponse::error(
                        id,
                        -32602,
                        "Invalid 'address' (0-65535)".to_string(),
                    );
                }
            },
        };
        gb.set_breakpoint(breakpoint);
        RpcResponse::success(
            id,
            serde_json::json!({"breakpoint": breakpoint.map(|a| format!("${a:04X}"))}),
        )
    }

    fn handle_poke(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let gb = match self.require_gb(&id) {
            Ok(gb) => gb,
            Err(e) => return e,
        };

        let Some(address) = params.get("address").and_then(address_param) else {
            return RpcResponse::error(
                id,
                -32602,
                "Missing or invalid 'address' (0-65535)".to_string(),
            );
        };
        let value = match params.get("value").and_then(|v| v.as_u64()) {
            Some(v) if v <= 0xFF => v as u8,
            _ => {
                return RpcResponse::error(
                    id,
                    -32602,
                    "Missing or invalid 'value' (0-255)".to_string(),
                );
            }
        };

        gb.poke(address, value);
        RpcResponse::success(id, serde_json::json!({"address": address, "value": value}))
    }

    fn handle_query(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let gb = match self.require_gb(&id) {
            Ok(gb) => gb,
            Err(e) => return e,
        };

        let Some(path) = params.get("path").and_then(|v| v.as_str()) else {
            return RpcResponse::error(id, -32602, "Missing 'path' parameter".to_string());
        };

        match gb.query(path) {
            Some(value) => {
                let json_val = observable_to_json(&value);
                RpcResponse::success(id, serde_json::json!({"path": path, "value": json_val}))
            }
            None => RpcResponse::error(id, -32000, format!("Unknown query path: {path}")),
        }
    }

    fn handle_registers(&mut self, id: JsonValue) -> RpcResponse {
        let gb = match self.require_gb(&id) {
            Ok(gb) => gb,
            Err(e) => return e,
        };

        let regs = gb.registers();
        let mut result = serde_json::to_value(regs).unwrap_or_default();
        if let Some(map) = result.as_object_mut() {
            map.insert(
                "flags".into(),
                serde_json::json!({
                    "z": regs.zero(),
                    "n": regs.subtract(),
                    "h": regs.half_carry(),
                    "c": regs.carry(),
                }),
            );
        }
        RpcResponse::success(id, result)
    }

    fn handle_header(&mut self, id: JsonValue) -> RpcResponse {
        let gb = match self.require_gb(&id) {
            Ok(gb) => gb,
            Err(e) => return e,
        };

        match gb.header_summary() {
            Some(summary) => {
                RpcResponse::success(id, serde_json::to_value(summary).unwrap_or_default())
            }
            None => RpcResponse::error(id, -32000, "No cartridge inserted".to_string()),
        }
    }

    fn handle_history(&mut self, id: JsonValue) -> RpcResponse {
        let gb = match self.require_gb(&id) {
            Ok(gb) => gb,
            Err(e) => return e,
        };

        let entries: Vec<JsonValue> = gb.history().map(trace_to_json).collect();
        RpcResponse::success(id, JsonValue::Array(entries))
    }

    fn handle_read_memory(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let gb = match self.require_gb(&id) {
            Ok(gb) => gb,
            Err(e) => return e,
        };

        let Some(address) = params.get("address").and_then(address_param) else {
            return RpcResponse::error(
                id,
                -32602,
                "Missing or invalid 'address' (0-65535)".to_string(),
            );
        };
        let length = match params.get("length").and_then(|v| v.as_u64()) {
            Some(l) if (1..=0x10000).contains(&l) => l as usize,
            Some(_) => {
                return RpcResponse::error(id, -32602, "Invalid 'length' (1-65536)".to_string());
            }
            None => 16,
        };

        let bytes: Vec<u8> = (0..length)
            .map(|i| gb.peek(address.wrapping_add(i as u16)))
            .collect();

        RpcResponse::success(
            id,
            serde_json::json!({
                "address": address,
                "length": length,
                "data": bytes,
            }),
        )
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An address given as a JSON number or as a `0x`/`$`/decimal string.
fn address_param(value: &JsonValue) -> Option<u16> {
    match value {
        JsonValue::Number(n) => n.as_u64().and_then(|a| u16::try_from(a).ok()),
        JsonValue::String(s) => parse_address(s),
        _ => None,
    }
}

fn trace_to_json(record: &Trace) -> JsonValue {
    let mut value = serde_json::to_value(record).unwrap_or_default();
    if let Some(map) = value.as_object_mut() {
        map.insert("text".into(), record.to_string().into());
    }
    value
}

fn observable_to_json(value: &emu_core::Value) -> JsonValue {
    match value {
        emu_core::Value::U8(v) => serde_json::json!(v),
        emu_core::Value::U16(v) => serde_json::json!(v),
        emu_core::Value::U64(v) => serde_json::json!(v),
        emu_core::Value::Bool(v) => serde_json::json!(v),
        emu_core::Value::String(v) => serde_json::json!(v),
        emu_core::Value::Bytes(v) => serde_json::json!(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::FixedEntropy;
    use crate::GbBus;
    use sharp_lr35902::Lr35902;

    /// Server around a cartridge-less machine running `program` from WRAM.
    fn server_with(program: &[u8]) -> McpServer {
        let mut bus = GbBus::new(None, None, Box::new(FixedEntropy(0)));
        for (i, &byte) in program.iter().enumerate() {
            bus.write_at(0xC000 + i as u16, byte);
        }
        let mut cpu = Lr35902::new();
        cpu.regs.pc = 0xC000;
        let mut server = McpServer::new();
        server.attach(GameBoy::with_bus(cpu, bus));
        server
    }

    fn result(resp: &RpcResponse) -> &JsonValue {
        resp.result.as_ref().expect("success response")
    }

    #[test]
    fn unknown_method_returns_error() {
        let mut server = McpServer::new();
        let resp = server.dispatch("nonexistent", &JsonValue::Null, JsonValue::from(1));
        assert!(resp.error.is_some());
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32601));
    }

    #[test]
    fn step_without_boot_returns_error() {
        let mut server = McpServer::new();
        let resp = server.dispatch("step_n", &serde_json::json!({"count": 1}), JsonValue::from(1));
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32000));
    }

    #[test]
    fn malformed_line_is_a_parse_error() {
        let mut server = McpServer::new();
        let resp = server.handle_line("{not json");
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32700));
        let resp = server.handle_line(r#"{"jsonrpc":"1.0","method":"step","id":3}"#);
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32600));
    }

    #[test]
    fn boot_without_rom_is_rejected() {
        let mut server = McpServer::new();
        let resp = server.dispatch("boot", &serde_json::json!({}), JsonValue::from(1));
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32602));
    }

    #[test]
    fn boot_from_base64() {
        let mut rom = vec![0u8; 0x8000];
        rom[0x100] = 0x00;
        let data = base64::engine::general_purpose::STANDARD.encode(&rom);
        let mut server = McpServer::new();
        let resp = server.dispatch(
            "boot",
            &serde_json::json!({"data": data, "seed": 7}),
            JsonValue::from(1),
        );
        assert_eq!(result(&resp)["status"], "ok");
        assert_eq!(result(&resp)["validity"], "logo mismatch");

        let resp = server.dispatch("registers", &JsonValue::Null, JsonValue::from(2));
        assert_eq!(result(&resp)["pc"], 0x00FE);
        assert_eq!(result(&resp)["flags"]["z"], true);
    }

    #[test]
    fn step_returns_trace() {
        let mut server = server_with(&[0x3E, 0x7B]);
        let resp = server.dispatch("step", &JsonValue::Null, JsonValue::from(1));
        let trace = result(&resp);
        assert_eq!(trace["address"], 0xC000);
        assert_eq!(trace["mnemonic"], "ld a, $7B");
        assert_eq!(trace["bytes"], serde_json::json!([0x3E, 0x7B]));
    }

    #[test]
    fn step_n_honours_breakpoint_string() {
        let mut server = server_with(&[0x00; 8]);
        let resp = server.dispatch(
            "step_n",
            &serde_json::json!({"count": 8, "breakpoint": "$C003"}),
            JsonValue::from(1),
        );
        assert_eq!(result(&resp)["executed"], 3);
        assert_eq!(result(&resp)["hit_breakpoint"], true);
        assert_eq!(result(&resp)["pc"], "$C003");
    }

    #[test]
    fn unknown_opcode_reports_step_error() {
        let mut server = server_with(&[0xD3]);
        let resp = server.dispatch("step", &JsonValue::Null, JsonValue::from(1));
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(UNKNOWN_OPCODE));
        // Still inspectable after the halt.
        let resp = server.dispatch("query", &serde_json::json!({"path": "cpu.pc"}), JsonValue::from(2));
        assert_eq!(result(&resp)["value"], 0xC001);
    }

    #[test]
    fn poke_then_read_memory() {
        let mut server = server_with(&[]);
        let resp = server.dispatch(
            "poke",
            &serde_json::json!({"address": "0xC100", "value": 0x42}),
            JsonValue::from(1),
        );
        assert!(resp.error.is_none());
        let resp = server.dispatch(
            "read_memory",
            &serde_json::json!({"address": 0xC0FF, "length": 3}),
            JsonValue::from(2),
        );
        assert_eq!(result(&resp)["data"], serde_json::json!([0, 0x42, 0]));
    }

    #[test]
    fn poke_rejects_wide_value() {
        let mut server = server_with(&[]);
        let resp = server.dispatch(
            "poke",
            &serde_json::json!({"address": 0xC000, "value": 0x100}),
            JsonValue::from(1),
        );
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32602));
    }

    #[test]
    fn header_without_cartridge_is_an_error() {
        let mut server = server_with(&[]);
        let resp = server.dispatch("header", &JsonValue::Null, JsonValue::from(1));
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32000));
    }
}
