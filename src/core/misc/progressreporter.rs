use indicatif::*;

pub struct ProgressReporter {
    pb: ProgressBar,
    current: u64,
}

impl ProgressReporter {
    pub fn new(total_work: usize, title: &str) -> Self {
        let pb = ProgressBar::new(total_work as u64);
        let template = format!("{{spinner:.bold.green}} {}: ", title)
            + "[{wide_bar:.cyan}]  ({pos}/{len} samples, {elapsed_precise}|{eta_precise}) {msg}";
        if let Ok(style) = ProgressStyle::with_template(&template) {
            pb.set_style(style.progress_chars("█▇▆▅▄▃▂▁  "));
        }
        pb.tick();
        ProgressReporter { pb, current: 0 }
    }

    pub fn update(&mut self, num: usize) {
        if num != 0 {
            self.current += num as u64;
            self.pb.inc(num as u64);
        }
    }

    /// Moves the bar to an absolute position; never moves it backwards.
    pub fn set_position(&mut self, pos: u64) {
        if pos > self.current {
            self.update((pos - self.current) as usize);
        }
    }

    pub fn set_message(&mut self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    pub fn done(&mut self) {
        self.pb.finish();
    }
}
