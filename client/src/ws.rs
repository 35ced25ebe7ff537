use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket, Window};

use sketchduel_shared::{ClientMessage, ServerMessage};

use crate::net::websocket_url;

const LOG_SNIPPET_LEN: usize = 200;

#[derive(Debug)]
pub enum WsEvent {
    Open,
    Close,
    Error,
    Message(ServerMessage),
}

pub struct WsSender {
    socket: WebSocket,
}

impl WsSender {
    pub fn is_open(&self) -> bool {
        self.socket.ready_state() == WebSocket::OPEN
    }

    /// Drops the message when the socket is not open.
    pub fn send(&self, message: &ClientMessage) {
        if !self.is_open() {
            return;
        }
        match serde_json::to_string(message) {
            Ok(payload) => {
                if let Err(error) = self.socket.send_with_str(&payload) {
                    web_sys::console::error_2(&"WS send failed".into(), &error);
                }
            }
            Err(error) => {
                web_sys::console::error_1(&format!("WS serialize error: {error}").into());
            }
        }
    }
}

fn parse_message(text: &str) -> Option<ServerMessage> {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(message) => Some(message),
        Err(error) => {
            let snippet: String = text.chars().take(LOG_SNIPPET_LEN).collect();
            let ellipsis = if snippet.len() < text.len() { "..." } else { "" };
            web_sys::console::error_1(
                &format!("WS message JSON parse error: {error} payload={snippet:?}{ellipsis}")
                    .into(),
            );
            None
        }
    }
}

pub fn connect_ws(
    window: &Window,
    on_event: impl 'static + FnMut(&WsSender, WsEvent),
) -> Result<Rc<WsSender>, JsValue> {
    let ws_url = websocket_url(window)?;
    let socket = WebSocket::new(&ws_url)?;

    let sender = Rc::new(WsSender {
        socket: socket.clone(),
    });

    let on_event = Rc::new(RefCell::new(on_event));

    {
        let on_event = on_event.clone();
        let sender = sender.clone();
        let onopen = Closure::<dyn FnMut(Event)>::new(move |_| {
            on_event.borrow_mut()(&sender, WsEvent::Open);
        });
        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();
    }

    {
        let on_event = on_event.clone();
        let sender = sender.clone();
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
            web_sys::console::warn_1(
                &format!(
                    "WS close code={} was_clean={} reason={:?}",
                    event.code(),
                    event.was_clean(),
                    event.reason()
                )
                .into(),
            );
            on_event.borrow_mut()(&sender, WsEvent::Close);
        });
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();
    }

    {
        let on_event = on_event.clone();
        let sender = sender.clone();
        let onerror = Closure::<dyn FnMut(Event)>::new(move |_| {
            on_event.borrow_mut()(&sender, WsEvent::Error);
        });
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }

    {
        let on_event = on_event.clone();
        let sender = sender.clone();
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let Some(text) = event.data().as_string() else {
                web_sys::console::error_2(&"WS message data is not a string".into(), &event.data());
                return;
            };
            if let Some(message) = parse_message(&text) {
                on_event.borrow_mut()(&sender, WsEvent::Message(message));
            }
        });
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();
    }

    {
        let socket = socket.clone();
        let onbeforeunload = Closure::<dyn FnMut(Event)>::new(move |_| {
            let _ = socket.close();
        });
        window.add_event_listener_with_callback(
            "beforeunload",
            onbeforeunload.as_ref().unchecked_ref(),
        )?;
        onbeforeunload.forget();
    }

    Ok(sender)
}
