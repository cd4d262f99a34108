use fibre_shardcache::policy::fifo::FifoPolicy;
use fibre_shardcache::{
  CacheBuilder, EvictCallback, EvictionListener, EvictionPolicy, PolicyConfig, RemoveReason,
  StrategyRegistry,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// A simple listener that just prints evicted entries.
struct MyListener;

impl EvictionListener<i32, String> for MyListener {
  fn on_evict(&self, key: i32, value: Arc<String>, reason: RemoveReason) {
    println!(
      "[Listener] Item removed! Key: {}, Value: '{}', Reason: {} ({})",
      key,
      value,
      reason,
      reason.code()
    );
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  println!("--- Cache with a Registered Strategy and Eviction Listener ---");

  // Register FIFO under a second name next to the built-in strategies.
  let mut registry = StrategyRegistry::<i32, String>::with_defaults();
  registry.register("queue", |config: PolicyConfig, on_evict: EvictCallback<i32, String>| {
    Box::new(FifoPolicy::new(config, on_evict)) as Box<dyn EvictionPolicy<i32, String>>
  });
  println!("Known strategies: {:?}", registry.names());

  let cache = CacheBuilder::new()
    .shards(1)
    .shard_capacity(3) // A small capacity to easily trigger evictions
    .registry(registry)
    .evict_strategy("Queue")
    .eviction_listener(MyListener)
    .build()
    .expect("Failed to build cache");

  cache.set(1, "one".to_string());
  cache.set(2, "two".to_string());
  cache.set(3, "three".to_string());
  println!("\nInserted keys 1, 2, 3. Cache is full.");

  // Under FIFO a read does not save key 1.
  println!("Reading key 1...");
  cache.get(&1);

  println!("\nInserting key 4. This will trigger an eviction.");
  cache.set(4, "four".to_string());

  println!("Deleting key 3.");
  cache.delete(&3);

  // Give the notifier thread a moment to run the listener.
  thread::sleep(Duration::from_millis(200));

  println!("\n--- Final State ---");
  assert!(cache.get(&1).is_none(), "Key 1 was inserted first");
  assert!(cache.get(&2).is_some());
  assert!(cache.get(&4).is_some());
  println!("Remaining keys: {:?}", cache.keys());

  cache.close().expect("Failed to close cache");
}
