//! Browser tests, run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use pinchcrop_core::{Color, CompositeMode, Rect, Shape, Surface};
use pinchcrop_wasm::{touch_centroid, CanvasSurface, JsCropper};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn container(width: u32, height: u32) -> HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let element: HtmlElement = document.create_element("div").unwrap().unchecked_into();
    element
        .style()
        .set_property("width", &format!("{width}px"))
        .unwrap();
    element
        .style()
        .set_property("height", &format!("{height}px"))
        .unwrap();
    document.body().unwrap().append_child(&element).unwrap();
    element
}

#[wasm_bindgen_test]
fn canvas_surface_resizes() {
    let document = web_sys::window().unwrap().document().unwrap();
    let mut surface = CanvasSurface::create(&document, 10, 10).unwrap();
    surface.fill(
        &Shape::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
        Color::BLACK,
        CompositeMode::Replace,
    );
    surface.set_size(40, 20);
    assert_eq!((surface.width(), surface.height()), (40, 20));
}

#[wasm_bindgen_test]
fn second_cropper_replaces_first() {
    let element = container(300, 300);
    let first = JsCropper::new(element.clone(), "data:,".to_string(), JsValue::UNDEFINED, None)
        .unwrap();
    let _second =
        JsCropper::new(element.clone(), "data:,".to_string(), JsValue::UNDEFINED, None).unwrap();
    assert!(first.crop(None, None).is_err());
}

#[wasm_bindgen_test]
fn invalid_options_throw() {
    let element = container(300, 300);
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &"containRatio".into(), &JsValue::from_f64(2.0)).unwrap();
    assert!(JsCropper::new(element, "a.png".to_string(), options.into(), None).is_err());
}

#[wasm_bindgen_test]
fn centroid_of_empty_list_is_null() {
    let result = touch_centroid(js_sys::Array::new().into()).unwrap();
    assert!(result.is_null() || result.is_undefined());
}
