//! # 批量执行器
//!
//! 并行解析扫描文件列表。解析结果按输入顺序返回：数据集的
//! 全局点索引由追加顺序决定，顺序必须与文件列表一致。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代
//! - 进度条显示
//! - 错误收集与汇总报告
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use std::path::PathBuf;

use rayon::prelude::*;

use crate::utils::progress;

/// 批量解析结果统计
#[derive(Debug, Default)]
pub struct BatchResult {
    /// 成功数量
    pub success: usize,
    /// 失败数量
    pub failed: usize,
    /// 失败详情 (文件路径, 错误信息)
    pub failures: Vec<(String, String)>,
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// 创建新的批量执行器（jobs = 0 取 CPU 核数）
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    /// 并行处理文件列表
    ///
    /// 返回按输入顺序排列的成功结果与统计；失败的文件只计入
    /// 统计，不中断其余文件。
    pub fn run<T, F>(&self, files: Vec<PathBuf>, processor: F) -> (Vec<T>, BatchResult)
    where
        T: Send,
        F: Fn(&PathBuf) -> Result<T, String> + Sync + Send,
    {
        let total = files.len();
        let pb = progress::create_progress_bar(total as u64, "Parsing");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .unwrap();

        let outcomes: Vec<(PathBuf, Result<T, String>)> = pool.install(|| {
            files
                .into_par_iter()
                .map(|file| {
                    let result = processor(&file);
                    pb.inc(1);
                    (file, result)
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut parsed = Vec::with_capacity(outcomes.len());
        let mut result = BatchResult::default();
        for (file, outcome) in outcomes {
            match outcome {
                Ok(value) => {
                    result.success += 1;
                    parsed.push(value);
                }
                Err(err) => {
                    result.failed += 1;
                    result.failures.push((file.display().to_string(), err));
                }
            }
        }

        (parsed, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_preserves_input_order() {
        let files: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("f{:02}", i))).collect();
        let (parsed, result) = BatchRunner::new(4).run(files, |f| {
            Ok::<_, String>(f.display().to_string())
        });
        assert_eq!(result.success, 20);
        assert_eq!(result.failed, 0);
        let expected: Vec<String> = (0..20).map(|i| format!("f{:02}", i)).collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_run_collects_failures() {
        let files = vec![PathBuf::from("good"), PathBuf::from("bad")];
        let (parsed, result) = BatchRunner::new(2).run(files, |f| {
            if f.to_string_lossy() == "bad" {
                Err("broken".to_string())
            } else {
                Ok(1)
            }
        });
        assert_eq!(parsed, vec![1]);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failures[0].0, "bad");
    }
}
