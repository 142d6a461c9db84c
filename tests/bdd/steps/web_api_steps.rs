use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use reqwest::Method;
use serde_json::{Value, json};

use crate::RetreatWorld;
use crate::steps::cli_steps::render;
use crate::steps::web_steps::http_request;

fn docstring_json(world: &RetreatWorld, step: &Step) -> Value {
    let text = step
        .docstring
        .as_deref()
        .expect("step needs a JSON docstring");
    serde_json::from_str(&world.expand(text))
        .unwrap_or_else(|e| panic!("docstring is not JSON: {e}\n{text}"))
}

fn last_json(world: &RetreatWorld) -> Value {
    let body = world
        .last_response_body
        .as_deref()
        .expect("no HTTP response recorded");
    serde_json::from_str(body).unwrap_or_else(|e| panic!("body is not JSON: {e}\n{body}"))
}

async fn log_in(world: &mut RetreatWorld, username: &str, password: &str) -> u16 {
    let (status, body) = http_request(
        world,
        Method::POST,
        "/api/login",
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    if status == 200 {
        let value: Value = serde_json::from_str(&body).expect("login response is JSON");
        world.token = value["token"].as_str().map(str::to_string);
    }
    status
}

#[given(expr = "I am logged in as {string} with password {string}")]
async fn i_am_logged_in(world: &mut RetreatWorld, username: String, password: String) {
    let status = log_in(world, &username, &password).await;
    assert_eq!(status, 200, "login as {username} failed");
}

#[when(expr = "I log in as {string} with password {string}")]
async fn i_log_in(world: &mut RetreatWorld, username: String, password: String) {
    log_in(world, &username, &password).await;
}

#[when(expr = "I POST {string} with:")]
async fn i_post_with(world: &mut RetreatWorld, path: String, step: &Step) {
    let body = docstring_json(world, step);
    http_request(world, Method::POST, &path, Some(body)).await;
}

#[when(expr = "I POST {string}")]
async fn i_post(world: &mut RetreatWorld, path: String) {
    http_request(world, Method::POST, &path, Some(json!({}))).await;
}

#[when(expr = "I PUT {string} with:")]
async fn i_put_with(world: &mut RetreatWorld, path: String, step: &Step) {
    let body = docstring_json(world, step);
    http_request(world, Method::PUT, &path, Some(body)).await;
}

#[when(expr = "I DELETE {string}")]
async fn i_delete(world: &mut RetreatWorld, path: String) {
    http_request(world, Method::DELETE, &path, None).await;
}

#[then(expr = "the JSON at {string} is {string}")]
async fn the_json_at(world: &mut RetreatWorld, pointer: String, expected: String) {
    let json = last_json(world);
    let actual = json
        .pointer(&pointer)
        .unwrap_or_else(|| panic!("no value at {pointer} in {json}"));
    assert_eq!(render(actual), world.expand(&expected), "at {pointer} in {json}");
}

#[then(expr = "I remember the JSON at {string} as {string}")]
async fn remember_json(world: &mut RetreatWorld, pointer: String, alias: String) {
    let json = last_json(world);
    let value = json
        .pointer(&pointer)
        .unwrap_or_else(|| panic!("no value at {pointer} in {json}"));
    world.ids.insert(alias, render(value));
}

#[given(expr = "a {string} program {string} priced {int} remembered as {string}")]
async fn a_program(
    world: &mut RetreatWorld,
    category: String,
    name: String,
    price: i64,
    alias: String,
) {
    let (status, body) = http_request(
        world,
        Method::POST,
        "/api/programs",
        Some(json!({ "name": name, "category": category, "unit_price": price })),
    )
    .await;
    assert_eq!(status, 201, "create program failed: {body}");
    let value: Value = serde_json::from_str(&body).expect("program is JSON");
    world.ids.insert(alias, render(&value["id"]));
}

#[given(expr = "a room {string} for {int} at {int} a night remembered as {string}")]
async fn a_room(world: &mut RetreatWorld, name: String, capacity: u32, rate: i64, alias: String) {
    let (status, body) = http_request(
        world,
        Method::POST,
        "/api/rooms",
        Some(json!({ "name": name, "capacity": capacity, "nightly_rate": rate })),
    )
    .await;
    assert_eq!(status, 201, "create room failed: {body}");
    let value: Value = serde_json::from_str(&body).expect("room is JSON");
    world.ids.insert(alias, render(&value["id"]));
}
