//! Cross-crate integration suite for the message bridge.

#[cfg(test)]
mod support;

#[cfg(test)]
mod channel_contract;

#[cfg(test)]
mod dispatch_order;

#[cfg(test)]
mod mirror_coherence;


#[cfg(all(test, not(target_arch = "wasm32")))]
mod cross_thread;

#[cfg(test)]
mod inspector_ndjson;
