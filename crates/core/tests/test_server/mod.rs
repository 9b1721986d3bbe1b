//! Local stand-in for the messaging web service.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use axum::http::HeaderMap;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub struct TestServer {
	addr: SocketAddr,
	shutdown: Option<oneshot::Sender<()>>,
	handle: Option<JoinHandle<()>>,
}

impl TestServer {
	pub async fn start(router: Router) -> Self {
		let listener = TcpListener::bind("127.0.0.1:0").await.expect("test server should bind");
		let addr = listener.local_addr().expect("bound listener has an address");
		let (tx, rx) = oneshot::channel::<()>();
		let handle = tokio::spawn(async move {
			axum::serve(listener, router)
				.with_graceful_shutdown(async {
					let _ = rx.await;
				})
				.await
				.expect("test server should run");
		});
		Self {
			addr,
			shutdown: Some(tx),
			handle: Some(handle),
		}
	}

	pub fn url(&self) -> String {
		format!("http://{}/", self.addr)
	}

	pub fn host(&self) -> String {
		self.addr.ip().to_string()
	}

	pub async fn shutdown(mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
		if let Some(handle) = self.handle.take() {
			let _ = handle.await;
		}
	}
}

impl Drop for TestServer {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

/// Landing page carrying a request token and a streaming endpoint.
pub fn landing(token: &str) -> String {
	format!(
		r#"<html><body><script>require(["DTSGInitialData",[],{{"token":"{token}"}},12]);
{{"appID":219994525426954,"endpoint":"wss:\/\/edge-chat.example.com\/chat?region=atn","pollingEndpoint":"x"}}
{{"client_revision":1009876,"tier":"prod"}}</script></body></html>"#
	)
}

pub fn checkpoint() -> String {
	r#"<html><body><a href="/checkpoint/block/?next=https%3A%2F%2Fexample.com%2F">Continue</a></body></html>"#.to_string()
}

/// Value of cookie `name` in the request's `Cookie` header.
pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
	headers
		.get_all(axum::http::header::COOKIE)
		.iter()
		.filter_map(|v| v.to_str().ok())
		.flat_map(|v| v.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(key, _)| *key == name)
		.map(|(_, value)| value.to_string())
}
