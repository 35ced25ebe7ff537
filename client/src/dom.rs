use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement, HtmlCanvasElement, HtmlElement, PointerEvent, Window};

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn set_status(status_el: &Element, status_text: &Element, state: &str, text: &str) {
    let _ = status_el.set_attribute("data-state", state);
    status_text.set_text_content(Some(text));
}

pub fn set_tool_button(button: &HtmlButtonElement, active: bool) {
    let pressed = if active { "true" } else { "false" };
    let _ = button.set_attribute("aria-pressed", pressed);
    let class_list = button.class_list();
    let _ = if active {
        class_list.add_1("active")
    } else {
        class_list.remove_1("active")
    };
}

pub fn set_visible(element: &HtmlElement, visible: bool) {
    let style = element.style();
    let _ = if visible {
        style.remove_property("display").map(|_| ())
    } else {
        style.set_property("display", "none")
    };
}

/// Sizes the canvas backing store to its laid-out size. Returns the size in
/// CSS pixels, the coordinate space strokes are kept in.
pub fn fit_canvas(window: &Window, canvas: &HtmlCanvasElement) -> (f64, f64, f64) {
    let width = f64::from(canvas.offset_width());
    let height = f64::from(canvas.offset_height());
    let dpr = window.device_pixel_ratio();
    canvas.set_width((width * dpr).round() as u32);
    canvas.set_height((height * dpr).round() as u32);
    web_sys::console::log_1(&format!("Canvas sized to {width}x{height} dpr={dpr}").into());
    (width, height, dpr)
}

pub fn pointer_position(canvas: &HtmlCanvasElement, event: &PointerEvent) -> Option<(f64, f64)> {
    let rect = canvas.get_bounding_client_rect();
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    let x = f64::from(event.client_x()) - rect.left();
    let y = f64::from(event.client_y()) - rect.top();
    Some((x, y))
}
