use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::state::GameView;

const MAX_CHAT_LINES: u32 = 100;

pub struct Panel {
    pub role: Element,
    pub score: Element,
    pub chat_log: HtmlElement,
    pub tools: HtmlElement,
    pub guess_form: HtmlElement,
}

impl Panel {
    pub fn render(&self, view: &GameView) {
        self.role.set_text_content(Some(&view.role_line()));
        self.score.set_text_content(Some(&view.score_line()));
    }

    pub fn set_notice(&self, text: &str) {
        self.role.set_text_content(Some(text));
    }

    /// Appends one line to the chat log, dropping the oldest past the cap.
    pub fn push_chat(&self, document: &Document, speaker: &str, text: &str, kind: &str) {
        let Ok(line_el) = document.create_element("li") else {
            return;
        };
        let Ok(line) = line_el.dyn_into::<HtmlElement>() else {
            return;
        };
        let _ = line.set_attribute("class", &format!("chat-line {kind}"));
        if let Ok(name) = document.create_element("strong") {
            name.set_text_content(Some(&format!("{speaker}: ")));
            let _ = line.append_child(&name);
        }
        if let Ok(body) = document.create_element("span") {
            body.set_text_content(Some(text));
            let _ = line.append_child(&body);
        }
        let _ = self.chat_log.append_child(&line);
        while self.chat_log.child_element_count() > MAX_CHAT_LINES {
            match self.chat_log.first_element_child() {
                Some(oldest) => oldest.remove(),
                None => break,
            }
        }
        self.chat_log.set_scroll_top(self.chat_log.scroll_height());
    }
}
