mod http;
mod timer;

pub use self::http::{
    ApiPath, Http, HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpResult,
};
pub use self::timer::{Timer, TimerFired, TimerOperation};

pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

pub type AppHttp = Http<Event>;
pub type AppRender = Render<Event>;
pub type AppTimer = Timer<Event>;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub timer: Timer<Event>,
}
