use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Event, HtmlButtonElement, HtmlCanvasElement,
    HtmlElement, HtmlInputElement, PointerEvent, Window,
};

use sketchduel_shared::{RoomCode, Role, ServerMessage};

use crate::board::Board;
use crate::dom::{fit_canvas, get_element, pointer_position, set_status, set_tool_button, set_visible};
use crate::net::{query_param, room_code_from_location};
use crate::panel::Panel;
use crate::render::CanvasSurface;
use crate::state::GameView;
use crate::ws::{connect_ws, WsEvent, WsSender};

type SharedBoard = Rc<RefCell<Board<CanvasSurface>>>;

fn debug_enabled(window: &Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    matches!(query_param(&search, "debug"), Some("1" | "true"))
}

fn document_ready_state(document: &Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    if document_ready_state(&document).as_deref() != Some("loading") {
        return start_app();
    }

    let started = Rc::new(Cell::new(false));
    let onready = Closure::<dyn FnMut(Event)>::new(move |_| {
        if started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    document.add_event_listener_with_callback("DOMContentLoaded", onready.as_ref().unchecked_ref())?;
    onready.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    match room_code_from_location(&window) {
        Some(room_code) => start_game(&window, &document, room_code),
        None => start_lobby(&window, &document),
    }
}

fn start_lobby(window: &Window, document: &Document) -> Result<(), JsValue> {
    let search = window.location().search().ok().unwrap_or_default();
    let Some(raw) = query_param(&search, "error") else {
        return Ok(());
    };
    let Some(error_el) = document.get_element_by_id("joinError") else {
        return Ok(());
    };
    let message = js_sys::decode_uri_component(&raw.replace('+', " "))
        .map(String::from)
        .unwrap_or_else(|_| raw.to_string());
    error_el.set_text_content(Some(&message));
    if let Ok(error_el) = error_el.dyn_into::<HtmlElement>() {
        set_visible(&error_el, true);
    }
    Ok(())
}

fn apply_role(board: &mut Board<CanvasSurface>, panel: &Panel, role: Option<Role>) {
    let drawer = role == Some(Role::Drawer);
    board.set_role(role.unwrap_or(Role::Guesser));
    set_visible(&panel.tools, drawer);
    set_visible(&panel.guess_form, role == Some(Role::Guesser));
}

fn handle_server_message(
    message: ServerMessage,
    document: &Document,
    board: &SharedBoard,
    view: &RefCell<GameView>,
    panel: &Panel,
) {
    match message {
        ServerMessage::Connected { player_id } => {
            view.borrow_mut().player_id = Some(player_id);
        }
        ServerMessage::Waiting { message } => {
            panel.set_notice(&message);
        }
        ServerMessage::GameStart { roles, prompt, .. } => {
            let mut view = view.borrow_mut();
            view.reset();
            let role = view.apply_roles(&roles, prompt);
            let mut board = board.borrow_mut();
            board.start_round();
            apply_role(&mut board, panel, role);
            panel.render(&view);
        }
        ServerMessage::DrawUpdate { action } => {
            board.borrow_mut().apply_update(action);
        }
        ServerMessage::ChatUpdate { message, player_id } => {
            let speaker = view.borrow().speaker(player_id);
            panel.push_chat(document, speaker, &message, "guess");
        }
        ServerMessage::CorrectGuess { player_id, scores } => {
            let mut view = view.borrow_mut();
            view.scores = scores;
            let speaker = view.speaker(player_id);
            panel.push_chat(document, speaker, "guessed it!", "correct");
            panel.render(&view);
        }
        ServerMessage::NewRound { roles, prompt } => {
            let mut view = view.borrow_mut();
            let role = view.apply_roles(&roles, prompt);
            let mut board = board.borrow_mut();
            board.start_round();
            apply_role(&mut board, panel, role);
            panel.render(&view);
        }
        ServerMessage::PlayerLeft { message } => {
            view.borrow_mut().role = None;
            apply_role(&mut board.borrow_mut(), panel, None);
            set_visible(&panel.guess_form, false);
            panel.set_notice(&message);
        }
        ServerMessage::Error { message } => {
            web_sys::console::warn_1(&format!("Server error: {message}").into());
            panel.set_notice(&message);
        }
    }
}

fn start_game(window: &Window, document: &Document, room_code: RoomCode) -> Result<(), JsValue> {
    let debug = debug_enabled(window);
    if debug {
        web_sys::console::log_1(&format!("SketchDuel debug enabled room={room_code}").into());
    }

    let canvas: HtmlCanvasElement = get_element(document, "drawingCanvas")?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    let color_input: HtmlInputElement = get_element(document, "colorPicker")?;
    let size_input: HtmlInputElement = get_element(document, "brushSize")?;
    let eraser_button: HtmlButtonElement = get_element(document, "eraserBtn")?;
    let undo_button: HtmlButtonElement = get_element(document, "undoBtn")?;
    let clear_button: HtmlButtonElement = get_element(document, "clearBtn")?;
    let guess_input: HtmlInputElement = get_element(document, "guessInput")?;
    let room_label: Element = get_element(document, "roomCode")?;
    let status_el: Element = get_element(document, "status")?;
    let status_text: Element = get_element(document, "statusText")?;

    let panel = Rc::new(Panel {
        role: get_element(document, "roleText")?,
        score: get_element(document, "scoreText")?,
        chat_log: get_element(document, "chatLog")?,
        tools: get_element(document, "tools")?,
        guess_form: get_element(document, "guessForm")?,
    });

    room_label.set_text_content(Some(room_code.as_str()));
    set_status(&status_el, &status_text, "connecting", "Connecting...");
    set_visible(&panel.tools, false);
    set_visible(&panel.guess_form, false);
    set_tool_button(&eraser_button, false);

    let board: SharedBoard = Rc::new(RefCell::new(Board::new(CanvasSurface::new(ctx), room_code)));
    let view = Rc::new(RefCell::new(GameView::default()));

    {
        let mut board = board.borrow_mut();
        board.tools.set_color(&color_input.value());
        board.tools.set_width_from_input(&size_input.value());
        let (width, height, dpr) = fit_canvas(window, &canvas);
        board.surface().reset(dpr);
        board.resize(width, height);
    }

    let sender = {
        let board = board.clone();
        let view = view.clone();
        let panel = panel.clone();
        let document = document.clone();
        let status_el = status_el.clone();
        let status_text = status_text.clone();
        connect_ws(window, move |sender: &WsSender, event: WsEvent| match event {
            WsEvent::Open => {
                set_status(&status_el, &status_text, "open", "Live connection");
                sender.send(&board.borrow().join_message());
            }
            WsEvent::Close => {
                set_status(&status_el, &status_text, "closed", "Offline");
            }
            WsEvent::Error => {
                web_sys::console::error_1(&"WS error".into());
                set_status(&status_el, &status_text, "closed", "Connection error");
            }
            WsEvent::Message(message) => {
                if debug {
                    web_sys::console::log_1(&format!("WS recv {}", message.kind()).into());
                }
                handle_server_message(message, &document, &board, &view, &panel);
            }
        })?
    };

    {
        let board = board.clone();
        let down_canvas = canvas.clone();
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let Some((x, y)) = pointer_position(&down_canvas, &event) else {
                return;
            };
            if board.borrow_mut().pointer_down(event.pointer_id(), x, y) {
                event.prevent_default();
                let _ = down_canvas.set_pointer_capture(event.pointer_id());
            }
        });
        canvas.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let board = board.clone();
        let sender = sender.clone();
        let move_canvas = canvas.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let Some((x, y)) = pointer_position(&move_canvas, &event) else {
                return;
            };
            let message = board.borrow_mut().pointer_move(event.pointer_id(), x, y);
            if let Some(message) = message {
                event.prevent_default();
                sender.send(&message);
            }
        });
        canvas.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    {
        let board = board.clone();
        let stop_canvas = canvas.clone();
        let onstop = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            board.borrow_mut().pointer_up(event.pointer_id());
            if stop_canvas.has_pointer_capture(event.pointer_id()) {
                let _ = stop_canvas.release_pointer_capture(event.pointer_id());
            }
        });
        for name in ["pointerup", "pointercancel", "pointerleave"] {
            canvas.add_event_listener_with_callback(name, onstop.as_ref().unchecked_ref())?;
        }
        onstop.forget();
    }

    {
        let board = board.clone();
        let color_input_cb = color_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            board.borrow_mut().tools.set_color(&color_input_cb.value());
        });
        color_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let board = board.clone();
        let size_input_cb = size_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            board
                .borrow_mut()
                .tools
                .set_width_from_input(&size_input_cb.value());
        });
        size_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let board = board.clone();
        let eraser_button_cb = eraser_button.clone();
        let color_input = color_input.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let erasing = board.borrow_mut().tools.toggle_eraser();
            color_input.set_disabled(erasing);
            set_tool_button(&eraser_button_cb, erasing);
        });
        eraser_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let board = board.clone();
        let sender = sender.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let message = board.borrow_mut().undo();
            if let Some(message) = message {
                sender.send(&message);
            }
        });
        undo_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let board = board.clone();
        let sender = sender.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let message = board.borrow_mut().clear();
            sender.send(&message);
        });
        clear_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let board = board.clone();
        let sender = sender.clone();
        let panel_cb = panel.clone();
        let document = document.clone();
        let onsubmit = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            event.prevent_default();
            let Some(message) = board.borrow().guess_message(&guess_input.value()) else {
                return;
            };
            sender.send(&message);
            if let sketchduel_shared::ClientMessage::Guess { guess, .. } = &message {
                panel_cb.push_chat(&document, "You", guess, "mine");
            }
            guess_input.set_value("");
        });
        panel
            .guess_form
            .add_event_listener_with_callback("submit", onsubmit.as_ref().unchecked_ref())?;
        onsubmit.forget();
    }

    {
        let board = board.clone();
        let window_cb = window.clone();
        let resize_canvas = canvas.clone();
        let onresize = Closure::<dyn FnMut()>::new(move || {
            let (width, height, dpr) = fit_canvas(&window_cb, &resize_canvas);
            let mut board = board.borrow_mut();
            board.surface().reset(dpr);
            board.resize(width, height);
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    Ok(())
}
