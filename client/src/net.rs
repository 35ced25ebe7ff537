use wasm_bindgen::JsValue;
use web_sys::Window;

use sketchduel_shared::RoomCode;

pub fn websocket_url(window: &Window) -> Result<String, JsValue> {
    let location = window.location();
    let protocol = location.protocol()?;
    let host = location.host()?;
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    Ok(format!("{scheme}://{host}/ws"))
}

pub fn room_code_from_location(window: &Window) -> Option<RoomCode> {
    let path = window.location().pathname().ok()?;
    room_code_from_path(&path)
}

fn room_code_from_path(path: &str) -> Option<RoomCode> {
    let mut parts = path.trim_matches('/').split('/');
    if parts.next()? != "game" {
        return None;
    }
    RoomCode::parse(parts.next()?).ok()
}

/// Raw (still percent-encoded) value of `key` in a `?a=b&c=d` string.
pub fn query_param<'a>(search: &'a str, key: &str) -> Option<&'a str> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)
}
