use fibre_shardcache::CacheBuilder;
use std::thread;
use std::time::Duration;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  // A cache with 16 shards, a 2-second TTL and a sweep every 500ms.
  let cache = CacheBuilder::<String, u64>::new()
    .shards(16)
    .expiration(Duration::from_secs(2))
    .clean_interval(Duration::from_millis(500))
    .build()
    .expect("Failed to build cache");

  println!("Setting ('key1', 100).");
  cache.set("key1".to_string(), 100);

  match cache.get(&"key1".to_string()) {
    Some(value) => println!("Found value for key1: {}", value),
    None => println!("Value for key1 not found."),
  }

  let (value, loaded) = cache.load_or_store("key1".to_string(), 7);
  println!("load_or_store(key1, 7) -> ({}, loaded = {})", value, loaded);

  let (value, swapped) = cache.compare_and_set("key1".to_string(), &100, 101, |a, b| a == b);
  println!("compare_and_set(key1, 100 -> 101) -> ({}, swapped = {})", value, swapped);

  println!("\nWaiting 3 seconds for the item to expire...");
  thread::sleep(Duration::from_secs(3));

  // The sweeper has removed the expired item by now.
  println!("Entries left: {}", cache.count());
  match cache.get(&"key1".to_string()) {
    Some(value) => println!("Found value for key1: {}", value),
    None => println!("Value for key1 not found (as expected after TTL)."),
  }

  cache.close().expect("Failed to close cache");
}
