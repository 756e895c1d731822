//! Printf-style and key/value logging through the global logger.

use oncelog::options;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    oncelog::configure([options::encoding("console"), options::development(false)])?;

    oncelog::infof!("hello world; name:{}; age:{}", "zhangsan", 18);
    oncelog::infow!("failed to fetch URL", "url" => "http://example.com", "attempt" => 3);
    oncelog::warnw!("slow request", "path" => "/api/users", "millis" => 1250);

    let sugar = oncelog::sugar().named("worker");
    sugar.debugf(format_args!("not written at info level"));
    sugar.errorw("job failed", &[("job", "reindex".into()), ("code", 500.into())]);

    oncelog::sync()?;
    Ok(())
}
