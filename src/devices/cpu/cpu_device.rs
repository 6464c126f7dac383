use crate::core::buffers::*;
use crate::core::device::*;
use crate::core::error::*;
use crate::core::kernel::*;
use crate::core::misc::*;

use log::*;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::RwLock;

/// Minimum seconds between two highlight updates of the same tile.
const TILE_UPDATE_INTERVAL: f64 = 1.0;

#[derive(Default)]
struct TaskPool {
    pending: Mutex<usize>,
    finished: Condvar,
    canceled: AtomicBool,
    error: Mutex<Option<String>>,
    kernel_data: RwLock<KernelData>,
}

impl TaskPool {
    fn begin(&self, count: usize) {
        *self.pending.lock().unwrap() += count;
    }

    fn end(&self) {
        let mut pending = self.pending.lock().unwrap();
        *pending -= 1;
        if *pending == 0 {
            // a cancel only applies to the tasks in flight
            if !self.has_error() {
                self.canceled.store(false, Ordering::SeqCst);
            }
            self.finished.notify_all();
        }
    }

    fn cancel(&self) {
        let pending = self.pending.lock().unwrap();
        if *pending > 0 {
            self.canceled.store(true, Ordering::SeqCst);
        }
    }

    fn canceled(&self) -> bool {
        return self.canceled.load(Ordering::SeqCst);
    }

    /// Keeps the first error and stops handing out work.
    fn set_error(&self, message: String) {
        let mut error = self.error.lock().unwrap();
        if error.is_none() {
            error!("{}", message);
            *error = Some(message);
        }
        self.canceled.store(true, Ordering::SeqCst);
    }

    fn has_error(&self) -> bool {
        return self.error.lock().unwrap().is_some();
    }
}

/// Host device running tasks on a rayon thread pool.
///
/// A render task occupies every pool thread; each one loops acquiring,
/// rendering and releasing tiles until the session runs out of them.
pub struct CpuDevice {
    info: DeviceInfo,
    kernel: Arc<dyn Kernel>,
    pool: rayon::ThreadPool,
    tasks: Arc<TaskPool>,
}

impl CpuDevice {
    /// `threads == 0` uses one thread per core.
    pub fn new(info: DeviceInfo, kernel: Arc<dyn Kernel>, threads: usize) -> SessionResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("cpu-device-{}", i))
            .build()
            .map_err(|e| SessionError::device(e.to_string()))?;
        info!(
            "CPU device {} with {} threads",
            info.id,
            pool.current_num_threads()
        );
        Ok(CpuDevice {
            info,
            kernel,
            pool,
            tasks: Arc::new(TaskPool::default()),
        })
    }

    pub fn num_threads(&self) -> usize {
        return self.pool.current_num_threads();
    }

    fn spawn<F>(&self, f: F)
    where
        F: FnOnce(&TaskPool) + Send + 'static,
    {
        let tasks = self.tasks.clone();
        tasks.begin(1);
        self.pool.spawn(move || {
            f(&tasks);
            tasks.end();
        });
    }

    fn thread_render(
        info: &DeviceInfo,
        kernel: &dyn Kernel,
        tasks: &TaskPool,
        task: &RenderTask,
    ) {
        let callbacks = task.callbacks.as_ref();
        let mut rtile = RenderTile::default();
        while callbacks.acquire_tile(info, &mut rtile) {
            match rtile.task {
                RenderTileTask::PathTrace => {
                    Self::path_trace(kernel, tasks, task, &mut rtile);
                }
                RenderTileTask::Denoise => {
                    Self::denoise(kernel, tasks, task, &rtile);
                }
            }
            callbacks.release_tile(&mut rtile);

            if tasks.has_error() {
                break;
            }
            if tasks.canceled() && !task.need_finish_queue {
                break;
            }
        }
    }

    fn path_trace(kernel: &dyn Kernel, tasks: &TaskPool, task: &RenderTask, rtile: &mut RenderTile) {
        let callbacks = task.callbacks.as_ref();
        let Some(buffers) = rtile.buffers.clone() else {
            tasks.set_error(format!("tile {} has no buffer", rtile.tile_index));
            return;
        };
        if rtile.is_empty() {
            return;
        }

        let (pass_stride, rng_hash) = {
            let buffers = buffers.read().unwrap();
            let mut rng_hash = Vec::with_capacity((rtile.w * rtile.h) as usize);
            for y in rtile.y..(rtile.y + rtile.h) {
                for x in rtile.x..(rtile.x + rtile.w) {
                    rng_hash.push(buffers.rng_state[rtile.pixel_index(x, y)]);
                }
            }
            (buffers.params.passes_size(), rng_hash)
        };

        let mut last_update = time_dt();
        let mut pixels = vec![[0.0f32; 4]; rng_hash.len()];
        for sample in rtile.start_sample..rtile.end_sample() {
            if callbacks.get_cancel() || tasks.canceled() {
                if !task.need_finish_queue || tasks.has_error() {
                    break;
                }
            }

            for (i, pixel) in pixels.iter_mut().enumerate() {
                let x = rtile.x + (i as i32 % rtile.w);
                let y = rtile.y + (i as i32 / rtile.w);
                match kernel.path_trace(x, y, sample, rng_hash[i]) {
                    Ok(value) => *pixel = value,
                    Err(e) => {
                        tasks.set_error(e.to_string());
                        return;
                    }
                }
            }

            {
                let mut buffers = buffers.write().unwrap();
                for (i, pixel) in pixels.iter().enumerate() {
                    let x = rtile.x + (i as i32 % rtile.w);
                    let y = rtile.y + (i as i32 / rtile.w);
                    let index = rtile.pixel_index(x, y) * pass_stride;
                    let combined = &mut buffers.buffer[index..(index + 4)];
                    if sample == 0 {
                        combined.copy_from_slice(pixel);
                    } else {
                        for c in 0..4 {
                            combined[c] += pixel[c];
                        }
                    }
                }
            }

            rtile.sample = sample + 1;
            callbacks.update_progress_sample();

            let now = time_dt();
            if now - last_update >= TILE_UPDATE_INTERVAL {
                callbacks.update_tile_sample(rtile);
                last_update = now;
            }
        }

        // tiles with their own border are denoised on their own
        let overscan = buffers.read().unwrap().params.overscan;
        if overscan > 0 && rtile.sample == rtile.end_sample() && !tasks.canceled() {
            let mut tiles: [RenderTile; 9] = Default::default();
            tiles[4] = rtile.clone();
            let data = tasks.kernel_data.read().unwrap().clone();
            if let Err(e) = kernel.denoise(&data, &tiles) {
                tasks.set_error(e.to_string());
            }
        }
    }

    fn denoise(kernel: &dyn Kernel, tasks: &TaskPool, task: &RenderTask, rtile: &RenderTile) {
        let mut tiles: [RenderTile; 9] = Default::default();
        tiles[4] = rtile.clone();
        task.callbacks.get_neighbor_tiles(&mut tiles);

        let data = tasks.kernel_data.read().unwrap().clone();
        if let Err(e) = kernel.denoise(&data, &tiles) {
            tasks.set_error(e.to_string());
            return;
        }
        task.callbacks.update_progress_sample();
    }

    fn film_convert(task: &FilmConvertTask) {
        let sample_scale = 1.0 / (task.sample + 1) as f32;
        let buffers = task.buffers.read().unwrap();
        let pass_stride = buffers.params.passes_size();
        let mut rgba = task.rgba.write().unwrap();
        let linear = rgba.linear;

        let w = task.w as usize;
        let convert = |row: usize, x: usize| -> [f32; 4] {
            let px = task.x + x as i32;
            let py = task.y + row as i32;
            let index = (task.offset + px + py * task.stride) as usize * pass_stride;
            let input = &buffers.buffer[index..(index + 4)];
            [
                input[0] * sample_scale,
                input[1] * sample_scale,
                input[2] * sample_scale,
                saturate(input[3] * sample_scale),
            ]
        };

        if linear {
            rgba.rgba_float[..(w * task.h as usize * 4)]
                .par_chunks_mut(w * 4)
                .enumerate()
                .for_each(|(row, out)| {
                    for x in 0..w {
                        out[(x * 4)..(x * 4 + 4)].copy_from_slice(&convert(row, x));
                    }
                });
        } else {
            rgba.rgba_byte[..(w * task.h as usize * 4)]
                .par_chunks_mut(w * 4)
                .enumerate()
                .for_each(|(row, out)| {
                    for x in 0..w {
                        let value = convert(row, x);
                        out[x * 4] = float_to_byte(gamma_correct(value[0]));
                        out[x * 4 + 1] = float_to_byte(gamma_correct(value[1]));
                        out[x * 4 + 2] = float_to_byte(gamma_correct(value[2]));
                        out[x * 4 + 3] = float_to_byte(value[3]);
                    }
                });
        }
    }

    fn shader(kernel: &dyn Kernel, task: &ShaderTask) {
        let values: Vec<[f32; 4]> = task.input[task.x..(task.x + task.w)]
            .par_iter()
            .map(|v| kernel.shader(v))
            .collect();
        let mut output = task.output.lock().unwrap();
        output[task.x..(task.x + task.w)].copy_from_slice(&values);
    }
}

impl Device for CpuDevice {
    fn info(&self) -> &DeviceInfo {
        return &self.info;
    }

    fn load_kernels(&self, features: &DeviceRequestedFeatures) -> SessionResult<()> {
        debug!(
            "CPU device {}: kernels for max closure {}, denoising {}",
            self.info.id, features.max_closure, features.use_denoising
        );
        return Ok(());
    }

    fn task_add(&self, task: DeviceTask) {
        trace!("CPU device {}: task {}", self.info.id, task.name());
        match task {
            DeviceTask::Render(task) | DeviceTask::Denoise(task) => {
                for _ in 0..self.pool.current_num_threads() {
                    let info = self.info.clone();
                    let kernel = self.kernel.clone();
                    let task = task.clone();
                    self.spawn(move |tasks| {
                        Self::thread_render(&info, kernel.as_ref(), tasks, &task);
                    });
                }
            }
            DeviceTask::FilmConvert(task) => {
                self.spawn(move |_| Self::film_convert(&task));
            }
            DeviceTask::Shader(task) => {
                let kernel = self.kernel.clone();
                self.spawn(move |_| Self::shader(kernel.as_ref(), &task));
            }
        }
    }

    fn task_wait(&self) {
        let pending = self.tasks.pending.lock().unwrap();
        let _pending = self
            .tasks
            .finished
            .wait_while(pending, |pending| *pending > 0)
            .unwrap();
    }

    fn task_cancel(&self) {
        self.tasks.cancel();
    }

    fn error_message(&self) -> Option<String> {
        return self.tasks.error.lock().unwrap().clone();
    }

    fn const_copy_to(&self, name: &str, data: &[u8]) {
        if name != KERNEL_DATA_NAME {
            warn!("CPU device {}: unknown constant {}", self.info.id, name);
            return;
        }
        match serde_json::from_slice::<KernelData>(data) {
            Ok(kernel_data) => *self.tasks.kernel_data.write().unwrap() = kernel_data,
            Err(e) => self.tasks.set_error(format!("invalid kernel data: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstantKernel;

    impl Kernel for ConstantKernel {
        fn path_trace(&self, _x: i32, _y: i32, _sample: i32, _rng_hash: u32) -> SessionResult<[f32; 4]> {
            Ok([0.5, 0.25, 1.0, 1.0])
        }

        fn shader(&self, input: &[f32; 4]) -> [f32; 4] {
            [input[0] * 2.0, input[1], input[2], input[3]]
        }
    }

    fn device() -> CpuDevice {
        CpuDevice::new(DeviceInfo::cpu(0), Arc::new(ConstantKernel), 2).unwrap()
    }

    #[test]
    fn test_001() {
        let device = device();
        assert_eq!(device.num_threads(), 2);
        let input = Arc::new(vec![[1.0, 2.0, 3.0, 4.0]; 8]);
        let output = Arc::new(Mutex::new(vec![[0.0; 4]; 8]));
        device.task_add(DeviceTask::Shader(ShaderTask {
            x: 2,
            w: 4,
            input,
            output: output.clone(),
        }));
        device.task_wait();
        let output = output.lock().unwrap();
        assert_eq!(output[1], [0.0; 4]);
        assert_eq!(output[2], [2.0, 2.0, 3.0, 4.0]);
        assert_eq!(output[5], [2.0, 2.0, 3.0, 4.0]);
        assert_eq!(output[6], [0.0; 4]);
    }

    #[test]
    fn test_002() {
        let device = device();
        let params = BufferParams::new(4, 4);
        let buffers = RenderBuffers::new_shared(0, &params);
        for v in buffers.write().unwrap().buffer.iter_mut() {
            *v = 2.0;
        }
        let mut display = DisplayBuffer::new(true);
        display.reset(&params);
        let (offset, stride) = params.offset_stride();
        device.task_add(DeviceTask::FilmConvert(FilmConvertTask {
            x: 0,
            y: 0,
            w: 4,
            h: 4,
            offset,
            stride,
            sample: 3,
            buffers,
            rgba: display.rgba.clone(),
        }));
        device.task_wait();
        let rgba = display.rgba.read().unwrap();
        assert_eq!(&rgba.rgba_float[0..4], &[0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_003() {
        let device = device();
        // nothing in flight, nothing to cancel
        device.task_cancel();
        assert!(!device.tasks.canceled());

        device.const_copy_to(KERNEL_DATA_NAME, b"not json");
        assert!(device.error_message().is_some());
        device.task_wait();
        // an error keeps the device canceled
        assert!(device.tasks.canceled());
    }
}
